//! Delivery cost estimation
//!
//! Prices a packaging plan in three tiers:
//! 1. the primary tariff against the resolved destination
//! 2. each alternate tariff, falling back to the default hub when the
//!    destination could not be resolved
//! 3. a local heuristic that needs no carrier at all
//!
//! Carrier failures of any kind fall through to the next tier. Only structural
//! misuse (blank destination, zero packages) is reported to the caller.

use super::models::{CostEstimate, CostSource, DestinationPoint, PackagingPlan, PriceBasis};
use crate::carrier::models::{CarrierQuote, LocationRef, PackageDescriptor, QuoteRequest};
use crate::carrier::CarrierPricing;
use crate::config::{CarrierConfig, EngineConfig, TariffConfig};
use crate::error::{CarrierError, EstimateError};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct DeliveryCostEstimator {
    config: Arc<EngineConfig>,
    carrier: Arc<dyn CarrierPricing>,
}

impl DeliveryCostEstimator {
    pub fn new(config: Arc<EngineConfig>, carrier: Arc<dyn CarrierPricing>) -> Self {
        Self { config, carrier }
    }

    /// Prices `plan` for delivery to `destination`.
    ///
    /// Always yields an estimate for structurally valid input, falling back to
    /// the local heuristic when the carrier cannot help.
    pub async fn estimate(
        &self,
        plan: &PackagingPlan,
        destination: &DestinationPoint,
        declared_value: f64,
    ) -> Result<CostEstimate, EstimateError> {
        if destination.point_code.trim().is_empty() {
            return Err(EstimateError::MissingDestination);
        }
        if plan.package_count == 0 {
            return Err(EstimateError::EmptyPlan);
        }

        let carrier_cfg = &self.config.carrier;
        let deadline = Instant::now() + carrier_cfg.estimate_timeout();
        let packages = package_descriptors(plan, carrier_cfg);
        let insured_value = (declared_value > carrier_cfg.insurance_threshold).then_some(declared_value);
        let resolved = resolve_location(destination, carrier_cfg);

        let request_for = |tariff_code: u32, to_location: LocationRef| QuoteRequest {
            tariff_code,
            from_location: LocationRef::Code(carrier_cfg.origin_location_code),
            to_location,
            packages: packages.clone(),
            insured_value,
        };

        match &resolved {
            Some(location) => {
                let request = request_for(carrier_cfg.primary_tariff, location.clone());
                if let Some(estimate) = self.attempt(&request, plan, CostSource::Api, deadline).await {
                    return Ok(estimate);
                }
            }
            None => warn!(
                point = %destination.point_code,
                "destination could not be resolved, skipping primary tariff"
            ),
        }

        let alternate_location =
            resolved.unwrap_or(LocationRef::Code(carrier_cfg.default_hub_location_code));
        for &tariff in &carrier_cfg.alternate_tariffs {
            if Instant::now() >= deadline {
                warn!(tariff, "estimate deadline passed, skipping remaining tariffs");
                break;
            }
            let request = request_for(tariff, alternate_location.clone());
            if let Some(estimate) = self
                .attempt(&request, plan, CostSource::AlternateTariff, deadline)
                .await
            {
                return Ok(estimate);
            }
        }

        let estimate = fallback_estimate(plan, declared_value, &self.config.tariff);
        info!(
            point = %destination.point_code,
            amount = estimate.amount,
            "carrier gave no usable price, using fallback heuristic"
        );
        Ok(estimate)
    }

    /// One carrier call bounded by the per-call timeout and the estimate
    /// deadline, whichever comes first; `None` when it produced nothing usable.
    async fn attempt(
        &self,
        request: &QuoteRequest,
        plan: &PackagingPlan,
        source: CostSource,
        deadline: Instant,
    ) -> Option<CostEstimate> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let timeout = self.config.carrier.request_timeout().min(remaining);
        if timeout.is_zero() {
            return None;
        }
        let outcome = match tokio::time::timeout(timeout, self.carrier.quote(request)).await {
            Ok(result) => result,
            Err(_) => Err(CarrierError::Timeout(timeout)),
        };

        match outcome {
            Ok(quote) => match quote_to_estimate(&quote, plan, source) {
                Some(mut estimate) => {
                    estimate.tariff_code = Some(request.tariff_code);
                    info!(tariff = request.tariff_code, amount = estimate.amount, ?source, "carrier priced shipment");
                    Some(estimate)
                }
                None => {
                    debug!(tariff = request.tariff_code, "carrier returned no usable price");
                    None
                }
            },
            Err(CarrierError::Unavailable) => {
                debug!(tariff = request.tariff_code, "carrier not configured");
                None
            }
            Err(err) => {
                warn!(tariff = request.tariff_code, error = %err, "carrier call failed");
                None
            }
        }
    }
}

fn quote_to_estimate(quote: &CarrierQuote, plan: &PackagingPlan, source: CostSource) -> Option<CostEstimate> {
    let price = quote.usable_price()?;
    let mut estimate = CostEstimate::from_raw_price(price, quote.basis, plan.package_count, source);
    estimate.period_min_days = quote.period_min_days;
    estimate.period_max_days = quote.period_max_days;
    Some(estimate)
}

/// Destination lookup order: location code, postal code, city, then the
/// longest matching point-identifier prefix.
pub fn resolve_location(destination: &DestinationPoint, config: &CarrierConfig) -> Option<LocationRef> {
    if let Some(code) = destination.location_code.filter(|c| *c > 0) {
        return Some(LocationRef::Code(code));
    }

    let non_blank = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    if let Some(postal) = non_blank(&destination.postal_code) {
        return Some(LocationRef::PostalCode(postal));
    }
    if let Some(city) = non_blank(&destination.city) {
        return Some(LocationRef::City(city));
    }

    let point = destination.point_code.trim().to_uppercase();
    config
        .point_prefix_locations
        .iter()
        .filter(|(prefix, _)| !prefix.is_empty() && point.starts_with(&prefix.to_uppercase()))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, code)| LocationRef::Code(*code))
}

/// One descriptor per package with carrier minimums applied.
pub fn package_descriptors(plan: &PackagingPlan, config: &CarrierConfig) -> Vec<PackageDescriptor> {
    let dims = plan.dimensions_cm;
    let descriptor = PackageDescriptor {
        weight: plan.weight_per_package_grams.max(config.min_package_weight_grams),
        length: dims.length.max(config.min_package_length),
        width: dims.width.max(config.min_package_width),
        height: dims.height.max(config.min_package_height),
    };
    vec![descriptor; plan.package_count as usize]
}

/// Local per-package heuristic, multiplied by the package count.
///
/// Surcharges accrue in whole steps above each free threshold; the declared
/// value is shared evenly between packages.
pub fn fallback_estimate(plan: &PackagingPlan, declared_value: f64, tariff: &TariffConfig) -> CostEstimate {
    let count = f64::from(plan.package_count.max(1));

    let weight = f64::from(plan.weight_per_package_grams);
    let volume = plan.dimensions_cm.volume_cm3();
    let value_share = if declared_value.is_finite() { declared_value / count } else { 0.0 };

    let weight_cost = surcharge(weight, tariff.weight_free_grams, tariff.weight_step_grams, tariff.weight_step_cost);
    let volume_cost = surcharge(volume, tariff.volume_free_cm3, tariff.volume_step_cm3, tariff.volume_step_cost);
    let value_cost = surcharge(value_share, tariff.value_free, tariff.value_step, tariff.value_step_cost);

    // Saturates instead of overflowing on extreme declared values
    let per_package = tariff
        .base_cost
        .saturating_add(weight_cost)
        .saturating_add(volume_cost)
        .saturating_add(value_cost);

    CostEstimate::from_raw_price(
        per_package as f64,
        PriceBasis::PerPackage,
        plan.package_count.max(1),
        CostSource::FallbackHeuristic,
    )
}

/// `cost` per whole step of `step` above `free`, rounded up
fn surcharge(value: f64, free: f64, step: f64, cost: u64) -> u64 {
    steps_over(value, free, step).saturating_mul(cost)
}

/// Whole steps of `step` above `free`, rounded up; saturates at `u64::MAX`
fn steps_over(value: f64, free: f64, step: f64) -> u64 {
    let over = value - free;
    if !(over > 0.0 && step > 0.0) {
        return 0;
    }
    (over / step).ceil() as u64
}
