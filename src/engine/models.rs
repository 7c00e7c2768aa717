//! Shipping Estimate Domain Models
//!
//! Data carried between the aggregator, planner and estimator. Everything here
//! is created per estimation request and dropped once the caller has it.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cart Input
// =============================================================================

/// Returns the default quantity (1) for line items
fn default_quantity() -> u32 {
    1
}

/// One purchased product line as supplied by the cart data source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Display name, used for log summaries only
    #[serde(default)]
    pub name: Option<String>,

    /// Quantity of this item (defaults to 1)
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Price of a single unit
    #[serde(default)]
    pub unit_price: f64,

    #[serde(default)]
    pub length_cm: Option<f64>,

    #[serde(default)]
    pub width_cm: Option<f64>,

    #[serde(default)]
    pub height_cm: Option<f64>,

    #[serde(default)]
    pub weight_grams: Option<f64>,
}

impl LineItem {
    /// Builds a fully dimensioned item.
    pub fn new(quantity: u32, unit_price: f64, dims: Dimensions, weight_grams: f64) -> Self {
        Self {
            name: None,
            quantity,
            unit_price,
            length_cm: Some(dims.length),
            width_cm: Some(dims.width),
            height_cm: Some(dims.height),
            weight_grams: Some(weight_grams),
        }
    }

    /// Item extents, only when all three axes are present and positive.
    ///
    /// A partially specified item is treated as dimensionless.
    pub fn dimensions(&self) -> Option<Dimensions> {
        let positive = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);
        Some(Dimensions {
            length: positive(self.length_cm)?,
            width: positive(self.width_cm)?,
            height: positive(self.height_cm)?,
        })
    }

    /// Weight of a single unit, zero when absent or nonsensical
    pub fn unit_weight(&self) -> f64 {
        self.weight_grams
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0)
    }

    /// Price of a single unit, zero when negative or not a number
    pub fn unit_value(&self) -> f64 {
        if self.unit_price.is_finite() && self.unit_price > 0.0 {
            self.unit_price
        } else {
            0.0
        }
    }
}

/// Length/width/height triple in centimetres
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Extents sorted ascending, for rotation-agnostic fit checks
    pub fn sorted(&self) -> [f64; 3] {
        let mut axes = [self.length, self.width, self.height];
        axes.sort_by(|a, b| a.total_cmp(b));
        axes
    }

    /// True when something of `other` extents fits inside, allowing rotation
    pub fn contains(&self, other: &Dimensions) -> bool {
        let outer = self.sorted();
        let inner = other.sorted();
        outer.iter().zip(inner.iter()).all(|(o, i)| o >= i)
    }
}

/// Aggregate of every line item in one cart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub total_weight_grams: f64,
    pub total_value: f64,
    pub total_volume_cm3: f64,
    pub max_length: f64,
    pub max_width: f64,
    pub max_height: f64,
    /// Sum of quantities
    pub item_count: u32,
    /// True only if at least one item contributed volume
    pub has_complete_dimensions: bool,
}

impl CartTotals {
    /// Per-axis maxima as a dimensions triple
    pub fn maxima(&self) -> Dimensions {
        Dimensions::new(self.max_length, self.max_width, self.max_height)
    }
}

// =============================================================================
// Packaging
// =============================================================================

/// A carrier box catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoxSpec {
    pub name: String,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub max_weight_grams: u32,
}

impl BoxSpec {
    pub fn new(name: &str, length: u32, width: u32, height: u32, max_weight_grams: u32) -> Self {
        Self {
            name: name.to_string(),
            length,
            width,
            height,
            max_weight_grams,
        }
    }

    pub fn volume_cm3(&self) -> f64 {
        f64::from(self.length) * f64::from(self.width) * f64::from(self.height)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            f64::from(self.length),
            f64::from(self.width),
            f64::from(self.height),
        )
    }

    pub fn package_dimensions(&self) -> PackageDimensions {
        PackageDimensions {
            length: self.length,
            width: self.width,
            height: self.height,
        }
    }
}

/// Whole-centimetre extents of one package
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageDimensions {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

impl PackageDimensions {
    /// Carrier "girth plus length": `2 × (height + width) + length`
    pub fn girth_plus_length(&self) -> u32 {
        2 * (self.height + self.width) + self.length
    }

    pub fn volume_cm3(&self) -> f64 {
        f64::from(self.length) * f64::from(self.width) * f64::from(self.height)
    }
}

/// Which planning branch produced a plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStrategy {
    /// Cart had no dimensioned items
    Default,
    /// One or two units, sized to the largest item
    Single,
    /// Sized proportionally to the largest item
    Proportional,
    /// Oversized box split into several smaller packages
    OversizeSplit,
    /// Very large order spread over catalog boxes
    Bulk,
    /// Smallest catalog box holding the whole cart
    Catalog,
}

/// Output of the package planner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackagingPlan {
    pub box_name: String,
    pub dimensions_cm: PackageDimensions,
    pub package_count: u32,
    pub weight_per_package_grams: u32,
    pub strategy: PlanStrategy,
}

// =============================================================================
// Destination & Cost
// =============================================================================

/// Pickup point chosen by the customer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationPoint {
    /// Carrier pickup point identifier, required
    #[serde(default)]
    pub point_code: String,

    #[serde(default)]
    pub location_code: Option<u32>,

    #[serde(default)]
    pub postal_code: Option<String>,

    #[serde(default)]
    pub city: Option<String>,
}

impl DestinationPoint {
    pub fn new(point_code: &str) -> Self {
        Self {
            point_code: point_code.to_string(),
            ..Self::default()
        }
    }
}

/// Where a cost estimate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CostSource {
    Api,
    AlternateTariff,
    FallbackHeuristic,
}

impl CostSource {
    /// Anything not confirmed by the primary tariff is shown as approximate
    pub fn is_approximate(&self) -> bool {
        !matches!(self, CostSource::Api)
    }
}

/// Whether a raw price already covered every package of the plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PriceBasis {
    /// Price is the total for all packages and must not be re-multiplied
    Aggregate,
    /// Price is for one package and was multiplied by the package count
    PerPackage,
}

/// Final delivery price for the whole shipment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    /// Total for the whole shipment in whole currency units
    pub amount: u64,
    pub source: CostSource,
    pub basis: PriceBasis,
    pub package_count: u32,
    pub tariff_code: Option<u32>,
    pub period_min_days: Option<u32>,
    pub period_max_days: Option<u32>,
}

impl CostEstimate {
    /// Normalises a raw price into a shipment total.
    ///
    /// Per-package prices are multiplied by `package_count` exactly once;
    /// aggregate prices are taken as-is. Fractions round up.
    pub fn from_raw_price(
        raw_price: f64,
        basis: PriceBasis,
        package_count: u32,
        source: CostSource,
    ) -> Self {
        let total = match basis {
            PriceBasis::Aggregate => raw_price,
            PriceBasis::PerPackage => raw_price * f64::from(package_count),
        };
        Self {
            amount: total.max(0.0).ceil() as u64,
            source,
            basis,
            package_count,
            tariff_code: None,
            period_min_days: None,
            period_max_days: None,
        }
    }
}

/// Everything the orchestrator produces for one cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimation {
    pub totals: CartTotals,
    pub plan: PackagingPlan,
    pub estimate: CostEstimate,
}
