//! Package planning
//!
//! Turns cart totals into a concrete packaging plan: how many packages, how
//! large each one is and how much weight goes into it. Every branch produces at
//! least one package and keeps every axis inside the carrier bounds.

use super::models::{BoxSpec, CartTotals, Dimensions, PackageDimensions, PackagingPlan, PlanStrategy};
use crate::config::{CarrierBounds, EngineConfig, SizingStrategy};
use tracing::debug;

/// Floating-point noise discarded before rounding lengths up
const ROUNDING_NOISE_CM: f64 = 1e-6;
/// Bound on linear shrink passes after a girth split
const MAX_SHRINK_PASSES: usize = 8;

/// Box name reported for directly scaled packages
const CUSTOM_BOX_NAME: &str = "custom";

/// Builds the packaging plan for `totals` under `config`.
pub fn plan(totals: &CartTotals, config: &EngineConfig) -> PackagingPlan {
    if !totals.has_complete_dimensions {
        debug!("cart has no dimensioned items, using default box");
        return PackagingPlan {
            box_name: config.default_box.name.clone(),
            dimensions_cm: config.default_box.package_dimensions(),
            package_count: 1,
            weight_per_package_grams: weight_share(totals.total_weight_grams, 1),
            strategy: PlanStrategy::Default,
        };
    }

    let packing_volume = totals.total_volume_cm3 * config.planner.packing_margin;

    if totals.item_count > config.planner.bulk_item_threshold {
        return plan_bulk(totals, config, packing_volume);
    }

    match config.planner.sizing {
        SizingStrategy::Scaled => plan_scaled(totals, config),
        SizingStrategy::Catalog => {
            let spec = select_box(&config.catalog, &totals.maxima(), packing_volume)
                .unwrap_or_else(|| config.largest_box());
            debug!(box_name = %spec.name, packing_volume, "catalog box selected");
            from_box(spec, 1, totals.total_weight_grams, PlanStrategy::Catalog)
        }
    }
}

/// Smallest catalog box, in ascending volume order, that fits `maxima` and
/// holds at least `min_volume`.
pub fn select_box<'a>(catalog: &'a [BoxSpec], maxima: &Dimensions, min_volume: f64) -> Option<&'a BoxSpec> {
    catalog
        .iter()
        .find(|spec| spec.volume_cm3() >= min_volume && spec.dimensions().contains(maxima))
}

fn plan_bulk(totals: &CartTotals, config: &EngineConfig, packing_volume: f64) -> PackagingPlan {
    let largest = config.largest_box();
    let needed = (packing_volume / largest.volume_cm3()).ceil();
    let max_packages = config.planner.max_bulk_packages.max(1);

    // Beyond the carrier ceiling the per-package volume is under-stated
    let package_count = if needed.is_finite() && needed >= 1.0 {
        (needed.min(f64::from(max_packages))) as u32
    } else {
        1
    };
    let volume_per_box = packing_volume / f64::from(package_count);

    let spec = select_box(&config.catalog, &totals.maxima(), volume_per_box).unwrap_or(largest);
    debug!(
        item_count = totals.item_count,
        package_count,
        volume_per_box,
        box_name = %spec.name,
        "bulk order planned"
    );

    from_box(spec, package_count, totals.total_weight_grams, PlanStrategy::Bulk)
}

fn plan_scaled(totals: &CartTotals, config: &EngineConfig) -> PackagingPlan {
    let planner = &config.planner;
    let bounds = &config.bounds;
    let maxima = totals.maxima();

    let (strategy, factor) = if totals.item_count <= planner.small_order_max_items {
        (PlanStrategy::Single, planner.small_order_axis_margin)
    } else {
        let volume_ratio = (totals.total_volume_cm3 / maxima.volume()).cbrt();
        let volume_ratio = if volume_ratio.is_finite() { volume_ratio } else { 1.0 };
        (
            PlanStrategy::Proportional,
            volume_ratio.max(1.0) * planner.large_order_axis_margin,
        )
    };

    let dims = clamp_dims(scale(&maxima, factor), bounds, bounds.max_axis);
    let girth = dims.girth_plus_length();

    if girth <= bounds.girth_limit {
        debug!(?strategy, ?dims, "scaled package within size limit");
        return PackagingPlan {
            box_name: CUSTOM_BOX_NAME.to_string(),
            dimensions_cm: dims,
            package_count: 1,
            weight_per_package_grams: weight_share(totals.total_weight_grams, 1),
            strategy,
        };
    }

    let (package_count, split) = split_oversize(dims, bounds);
    debug!(girth, package_count, ?split, "package exceeds size limit, splitting");

    PackagingPlan {
        box_name: CUSTOM_BOX_NAME.to_string(),
        dimensions_cm: split,
        package_count,
        weight_per_package_grams: weight_share(totals.total_weight_grams, package_count),
        strategy: PlanStrategy::OversizeSplit,
    }
}

/// Splits an oversize package into `ceil(girth / target)` smaller ones.
fn split_oversize(dims: PackageDimensions, bounds: &CarrierBounds) -> (u32, PackageDimensions) {
    let total = f64::from(dims.girth_plus_length());
    let target = f64::from(bounds.girth_target);
    let package_count = ((total / target).ceil() as u32).max(1);

    let as_f64 = to_dimensions(&dims);
    let mut split = clamp_dims(scale(&as_f64, (target / total).cbrt()), bounds, bounds.split_max_axis);

    // The cube-root rescale alone does not always get under the limit
    for _ in 0..MAX_SHRINK_PASSES {
        let girth = split.girth_plus_length();
        if girth <= bounds.girth_limit {
            break;
        }
        let shrink = target / f64::from(girth);
        split = clamp_dims(scale(&to_dimensions(&split), shrink), bounds, bounds.split_max_axis);
    }

    (package_count, split)
}

fn from_box(spec: &BoxSpec, package_count: u32, total_weight: f64, strategy: PlanStrategy) -> PackagingPlan {
    PackagingPlan {
        box_name: spec.name.clone(),
        dimensions_cm: spec.package_dimensions(),
        package_count,
        weight_per_package_grams: weight_share(total_weight, package_count),
        strategy,
    }
}

fn scale(dims: &Dimensions, factor: f64) -> Dimensions {
    Dimensions::new(dims.length * factor, dims.width * factor, dims.height * factor)
}

fn to_dimensions(dims: &PackageDimensions) -> Dimensions {
    Dimensions::new(
        f64::from(dims.length),
        f64::from(dims.width),
        f64::from(dims.height),
    )
}

fn clamp_dims(dims: Dimensions, bounds: &CarrierBounds, max_axis: u32) -> PackageDimensions {
    PackageDimensions {
        length: clamp_axis(dims.length, bounds.min_length, max_axis),
        width: clamp_axis(dims.width, bounds.min_width, max_axis),
        height: clamp_axis(dims.height, bounds.min_height, max_axis),
    }
}

/// Rounds up to whole centimetres and clamps into `[min, max]`.
fn clamp_axis(value: f64, min: u32, max: u32) -> u32 {
    if value.is_nan() {
        return min;
    }
    let rounded = (value - ROUNDING_NOISE_CM).ceil();
    rounded.clamp(f64::from(min), f64::from(max.max(min))) as u32
}

/// Weight per package, rounded up so the packages never carry less than the total.
fn weight_share(total_weight: f64, package_count: u32) -> u32 {
    if !(total_weight.is_finite() && total_weight > 0.0) {
        return 0;
    }
    let share = (total_weight / f64::from(package_count.max(1)) - ROUNDING_NOISE_CM).ceil();
    share.min(f64::from(u32::MAX)) as u32
}
