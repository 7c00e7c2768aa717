//! Estimation composition root
//!
//! Aggregates the cart, plans packages and prices them in one call.

use super::aggregator::{aggregate, apply_floors, format_item_summary};
use super::estimator::DeliveryCostEstimator;
use super::models::{DestinationPoint, Estimation, LineItem};
use super::planner;
use crate::carrier::CarrierPricing;
use crate::config::EngineConfig;
use crate::error::EstimateError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Everything needed to estimate one cart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimationInput {
    pub items: Vec<LineItem>,
    pub destination: DestinationPoint,
    /// Value declared to the carrier; defaults to the cart value
    #[serde(default)]
    pub declared_value: Option<f64>,
    /// Trusted order total used when the cart value resolves to zero
    #[serde(default)]
    pub order_total: Option<f64>,
}

pub struct EstimationOrchestrator {
    config: Arc<EngineConfig>,
    estimator: DeliveryCostEstimator,
}

impl EstimationOrchestrator {
    pub fn new(config: Arc<EngineConfig>, carrier: Arc<dyn CarrierPricing>) -> Self {
        let estimator = DeliveryCostEstimator::new(config.clone(), carrier);
        Self { config, estimator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs aggregation, planning and pricing for `input`.
    pub async fn estimate(&self, input: &EstimationInput) -> Result<Estimation, EstimateError> {
        if input.destination.point_code.trim().is_empty() {
            return Err(EstimateError::MissingDestination);
        }

        let totals = apply_floors(aggregate(&input.items), &self.config.floors, input.order_total);
        let plan = planner::plan(&totals, &self.config);

        let declared_value = input
            .declared_value
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(totals.total_value);

        let estimate = self
            .estimator
            .estimate(&plan, &input.destination, declared_value)
            .await?;

        info!(
            items = %format_item_summary(&input.items),
            point = %input.destination.point_code,
            packages = plan.package_count,
            box_name = %plan.box_name,
            amount = estimate.amount,
            source = ?estimate.source,
            "shipping estimated"
        );

        Ok(Estimation {
            totals,
            plan,
            estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::OfflineCarrier;
    use crate::engine::models::{CostSource, Dimensions, PlanStrategy};

    fn offline() -> EstimationOrchestrator {
        EstimationOrchestrator::new(Arc::new(EngineConfig::default()), Arc::new(OfflineCarrier))
    }

    fn single_parcel_input() -> EstimationInput {
        EstimationInput {
            items: vec![LineItem::new(1, 2000.0, Dimensions::new(30.0, 20.0, 15.0), 1000.0)],
            destination: DestinationPoint::new("MSK005"),
            declared_value: None,
            order_total: None,
        }
    }

    #[tokio::test]
    async fn single_parcel_end_to_end_offline() {
        let estimation = offline().estimate(&single_parcel_input()).await.unwrap();

        assert!(estimation.totals.has_complete_dimensions);
        assert_eq!(estimation.plan.package_count, 1);
        assert_eq!(estimation.plan.weight_per_package_grams, 1000);
        assert_eq!(estimation.plan.dimensions_cm.width, 21);
        assert_eq!(estimation.plan.dimensions_cm.height, 16);
        assert_eq!(estimation.estimate.source, CostSource::FallbackHeuristic);
        assert_eq!(estimation.estimate.amount, 390);
    }

    #[tokio::test]
    async fn repeated_estimates_are_identical() {
        let orchestrator = offline();
        let input = single_parcel_input();

        let first = orchestrator.estimate(&input).await.unwrap();
        let second = orchestrator.estimate(&input).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_cart_uses_floors_and_default_box() {
        let input = EstimationInput {
            items: Vec::new(),
            destination: DestinationPoint::new("SPB1"),
            declared_value: None,
            order_total: Some(5000.0),
        };
        let estimation = offline().estimate(&input).await.unwrap();

        assert_eq!(estimation.plan.strategy, PlanStrategy::Default);
        assert_eq!(estimation.totals.total_weight_grams, 500.0);
        assert_eq!(estimation.totals.total_value, 5000.0);
        // default box 30×20×15 = 9000 cm³, 500 g, value 5000 → 2 value steps
        assert_eq!(estimation.estimate.amount, 350 + 2 * 25);
    }

    #[tokio::test]
    async fn explicit_declared_value_overrides_cart_value() {
        let mut input = single_parcel_input();
        input.declared_value = Some(0.0);
        let estimation = offline().estimate(&input).await.unwrap();
        assert_eq!(estimation.estimate.amount, 390);

        input.declared_value = Some(10_000.0);
        let estimation = offline().estimate(&input).await.unwrap();
        assert_eq!(estimation.estimate.amount, 390 + 7 * 25);
    }

    #[tokio::test]
    async fn huge_unit_price_prices_without_overflow() {
        let mut input = single_parcel_input();
        input.items[0].unit_price = 1e24;
        let estimation = offline().estimate(&input).await.unwrap();

        assert_eq!(estimation.estimate.source, CostSource::FallbackHeuristic);
        assert_eq!(estimation.estimate.amount, u64::MAX);
    }

    #[tokio::test]
    async fn blank_destination_is_rejected() {
        let mut input = single_parcel_input();
        input.destination.point_code = String::new();
        assert_eq!(
            offline().estimate(&input).await,
            Err(EstimateError::MissingDestination)
        );
    }
}
