//! Shipping API Models
//!
//! Request and response bodies shared by the REST endpoints and the MCP tools.

use crate::engine::models::{CartTotals, CostEstimate, DestinationPoint, Estimation, LineItem, PackagingPlan};
use crate::engine::EstimationInput;
use serde::{Deserialize, Serialize};

// =============================================================================
// Estimate
// =============================================================================

/// Input for the estimate endpoint and the estimate_shipping tool
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Cart line items
    pub items: Vec<LineItem>,

    /// Pickup point the parcel goes to
    pub destination: DestinationPoint,

    /// Value declared to the carrier (defaults to the cart value)
    #[serde(default)]
    pub declared_value: Option<f64>,

    /// Trusted order total, used when the cart value resolves to zero
    #[serde(default)]
    pub order_total: Option<f64>,

    /// Checkout session; newer requests in a session supersede older ones
    #[serde(default)]
    pub session_id: Option<String>,
}

impl EstimateRequest {
    /// Splits off the session identifier from the engine input
    pub fn into_parts(self) -> (Option<String>, EstimationInput) {
        (
            self.session_id,
            EstimationInput {
                items: self.items,
                destination: self.destination,
                declared_value: self.declared_value,
                order_total: self.order_total,
            },
        )
    }
}

/// Outcome status of an estimate request
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Estimated,
    /// A newer request for the same session finished or is in flight
    Superseded,
}

/// Response for estimate operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub session_id: String,
    pub status: EstimateStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<CartTotals>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PackagingPlan>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<CostEstimate>,

    /// True when the price is not confirmed by the primary tariff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approximate: Option<bool>,
}

impl EstimateResponse {
    pub fn estimated(session_id: String, estimation: Estimation) -> Self {
        Self {
            session_id,
            status: EstimateStatus::Estimated,
            approximate: Some(estimation.estimate.source.is_approximate()),
            totals: Some(estimation.totals),
            plan: Some(estimation.plan),
            estimate: Some(estimation.estimate),
        }
    }

    pub fn superseded(session_id: String) -> Self {
        Self {
            session_id,
            status: EstimateStatus::Superseded,
            totals: None,
            plan: None,
            estimate: None,
            approximate: None,
        }
    }
}

/// Error body for rejected requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Price Text
// =============================================================================

/// Input for the reconcile_price endpoint and tool
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    /// Rendered price text
    pub text: String,
}

/// Response for price text reconciliation
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub original: String,
    pub repaired: String,
    /// First number in the repaired text, 0 when none
    pub value: f64,
    pub changed: bool,
}
