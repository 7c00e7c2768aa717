//! Cart aggregation
//!
//! Reduces line items to the totals the planner works from.

use super::models::{CartTotals, LineItem};
use crate::config::CartFloors;

/// Sums weight, value and volume and tracks per-axis maxima.
///
/// Every item contributes weight and value. Only fully dimensioned items
/// contribute volume and maxima, with maxima taken from the item's own extents
/// rather than scaled by quantity.
pub fn aggregate(items: &[LineItem]) -> CartTotals {
    let mut totals = CartTotals::default();

    for item in items {
        let quantity = f64::from(item.quantity);

        totals.total_weight_grams += item.unit_weight() * quantity;
        totals.total_value += item.unit_value() * quantity;
        totals.item_count = totals.item_count.saturating_add(item.quantity);

        let Some(dims) = item.dimensions() else {
            continue;
        };
        if item.quantity == 0 {
            continue;
        }

        totals.total_volume_cm3 += dims.volume() * quantity;
        totals.max_length = totals.max_length.max(dims.length);
        totals.max_width = totals.max_width.max(dims.width);
        totals.max_height = totals.max_height.max(dims.height);
        totals.has_complete_dimensions = true;
    }

    totals
}

/// Substitutes minimums for a zero weight or value.
///
/// A positive trusted `order_total` wins over the value floor.
pub fn apply_floors(totals: CartTotals, floors: &CartFloors, order_total: Option<f64>) -> CartTotals {
    let mut floored = totals;

    if floored.total_weight_grams <= 0.0 {
        floored.total_weight_grams = floors.min_weight_grams;
    }

    if floored.total_value <= 0.0 {
        floored.total_value = order_total
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(floors.min_value);
    }

    floored
}

/// Produces a human-readable one-line summary for a list of line items.
///
/// Example output: `"2x Kettle, 1x item"`.
pub fn format_item_summary(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.quantity, i.name.as_deref().unwrap_or("item")))
        .collect::<Vec<_>>()
        .join(", ")
}
