//! Cart-to-Shipment Estimation Engine
//!
//! This module contains the estimation pipeline, leaves first:
//! - Price text repair for rendered totals
//! - Cart aggregation into shippable totals
//! - Package planning against the carrier box catalog and size limits
//! - Delivery cost estimation with tiered fallback
//! - The orchestrator composing the three pipeline stages

pub mod aggregator;
pub mod estimator;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod price_text;

// Re-export commonly used types for convenience
pub use estimator::DeliveryCostEstimator;
pub use orchestrator::{EstimationInput, EstimationOrchestrator};
pub use price_text::PriceTextReconciler;
