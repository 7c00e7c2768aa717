//! Engine and server configuration
//!
//! Carrier-specific tuning (box catalog, margins, clamp bounds, surcharge
//! thresholds, tariff codes) lives here as data so the algorithms never carry
//! deployment literals. Every section deserializes with defaults, so a JSON
//! override file only needs the fields it changes.

use crate::engine::models::BoxSpec;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete tuning for one carrier deployment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Box catalog, smallest to largest
    pub catalog: Vec<BoxSpec>,
    /// Box used when the cart carries no dimensions
    pub default_box: BoxSpec,
    pub planner: PlannerConfig,
    pub bounds: CarrierBounds,
    pub floors: CartFloors,
    pub tariff: TariffConfig,
    pub carrier: CarrierConfig,
    pub price_text: PriceTextConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: vec![
                BoxSpec::new("XS", 17, 12, 9, 500),
                BoxSpec::new("S", 23, 19, 10, 2_000),
                BoxSpec::new("M", 33, 25, 15, 5_000),
                BoxSpec::new("L", 31, 25, 38, 12_000),
                BoxSpec::new("XL", 60, 35, 30, 18_000),
            ],
            default_box: BoxSpec::new("default", 30, 20, 15, 5_000),
            planner: PlannerConfig::default(),
            bounds: CarrierBounds::default(),
            floors: CartFloors::default(),
            tariff: TariffConfig::default(),
            carrier: CarrierConfig::default(),
            price_text: PriceTextConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads a JSON override file on top of the defaults and validates it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Largest catalog entry. Validation guarantees the catalog is non-empty.
    pub fn largest_box(&self) -> &BoxSpec {
        self.catalog.last().unwrap_or(&self.default_box)
    }

    /// Checks the invariants the planner relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for pair in self.catalog.windows(2) {
            if pair[1].volume_cm3() <= pair[0].volume_cm3() {
                return Err(ConfigError::CatalogNotAscending(pair[1].name.clone()));
            }
        }

        for spec in self.catalog.iter().chain(std::iter::once(&self.default_box)) {
            if !self.bounds.admits(spec) {
                return Err(ConfigError::BoxOutOfBounds(spec.name.clone()));
            }
        }

        let steps = [
            ("tariff.weightStepGrams", self.tariff.weight_step_grams),
            ("tariff.volumeStepCm3", self.tariff.volume_step_cm3),
            ("tariff.valueStep", self.tariff.value_step),
        ];
        for (name, step) in steps {
            if !(step.is_finite() && step > 0.0) {
                return Err(ConfigError::InvalidStep(name));
            }
        }
        if self.bounds.girth_target == 0 || self.bounds.girth_target > self.bounds.girth_limit {
            return Err(ConfigError::InvalidStep("bounds.girthTarget"));
        }

        Ok(())
    }
}

/// Margins and thresholds driving the planner branches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    /// Packing material allowance applied to the total volume
    pub packing_margin: f64,
    /// Orders up to this many units get a single item-sized package
    pub small_order_max_items: u32,
    pub small_order_axis_margin: f64,
    pub large_order_axis_margin: f64,
    /// Orders above this many units use the bulk policy
    pub bulk_item_threshold: u32,
    /// Hard carrier ceiling on bulk package count
    pub max_bulk_packages: u32,
    pub sizing: SizingStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            packing_margin: 1.2,
            small_order_max_items: 2,
            small_order_axis_margin: 1.05,
            large_order_axis_margin: 1.1,
            bulk_item_threshold: 200,
            max_bulk_packages: 5,
            sizing: SizingStrategy::Scaled,
        }
    }
}

/// How non-bulk orders are sized
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SizingStrategy {
    /// Scale the largest item, then split on the girth limit
    #[default]
    Scaled,
    /// Pick the smallest catalog box holding the packing volume
    Catalog,
}

/// Carrier size limits in centimetres
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CarrierBounds {
    pub min_length: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_axis: u32,
    /// Upper bound on `2 × (height + width) + length`
    pub girth_limit: u32,
    /// Size each split package is shrunk toward
    pub girth_target: u32,
    /// Per-axis cap once a package has been split
    pub split_max_axis: u32,
}

impl Default for CarrierBounds {
    fn default() -> Self {
        Self {
            min_length: 10,
            min_width: 10,
            min_height: 5,
            max_axis: 150,
            girth_limit: 300,
            girth_target: 280,
            split_max_axis: 100,
        }
    }
}

impl CarrierBounds {
    fn admits(&self, spec: &BoxSpec) -> bool {
        let within = |v: u32, min: u32| v >= min && v <= self.max_axis;
        within(spec.length, self.min_length)
            && within(spec.width, self.min_width)
            && within(spec.height, self.min_height)
    }
}

/// Minimums substituted when a cart resolves to zero weight or value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CartFloors {
    pub min_weight_grams: f64,
    pub min_value: f64,
}

impl Default for CartFloors {
    fn default() -> Self {
        Self {
            min_weight_grams: 500.0,
            min_value: 1_000.0,
        }
    }
}

/// Local heuristic used when the carrier cannot price a shipment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TariffConfig {
    pub base_cost: u64,
    pub weight_free_grams: f64,
    pub weight_step_grams: f64,
    pub weight_step_cost: u64,
    pub volume_free_cm3: f64,
    pub volume_step_cm3: f64,
    pub volume_step_cost: u64,
    pub value_free: f64,
    pub value_step: f64,
    pub value_step_cost: u64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            base_cost: 350,
            weight_free_grams: 500.0,
            weight_step_grams: 500.0,
            weight_step_cost: 40,
            volume_free_cm3: 12_000.0,
            volume_step_cm3: 6_000.0,
            volume_step_cost: 60,
            value_free: 3_000.0,
            value_step: 1_000.0,
            value_step_cost: 25,
        }
    }
}

/// Carrier Pricing Service request parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CarrierConfig {
    /// Warehouse location code shipments leave from
    pub origin_location_code: u32,
    /// Hub used by alternate tariffs when the destination cannot be resolved
    pub default_hub_location_code: u32,
    pub primary_tariff: u32,
    pub alternate_tariffs: Vec<u32>,
    /// Declared values above this are sent as insured value
    pub insurance_threshold: f64,
    pub min_package_weight_grams: u32,
    pub min_package_length: u32,
    pub min_package_width: u32,
    pub min_package_height: u32,
    /// Bound on a single carrier call
    pub request_timeout_secs: u64,
    /// Bound on all carrier calls of one estimate together
    pub estimate_timeout_secs: u64,
    /// Point identifier prefix → location code
    pub point_prefix_locations: BTreeMap<String, u32>,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        let point_prefix_locations = [
            ("MSK", 44),
            ("SPB", 137),
            ("EKB", 250),
            ("NSK", 270),
            ("KZN", 424),
            ("NN", 414),
        ]
        .into_iter()
        .map(|(prefix, code)| (prefix.to_string(), code))
        .collect();

        Self {
            origin_location_code: 44,
            default_hub_location_code: 44,
            primary_tariff: 136,
            alternate_tariffs: vec![137, 368, 233],
            insurance_threshold: 3_000.0,
            min_package_weight_grams: 100,
            min_package_length: 10,
            min_package_width: 10,
            min_package_height: 5,
            request_timeout_secs: 20,
            estimate_timeout_secs: 30,
            point_prefix_locations,
        }
    }
}

impl CarrierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn estimate_timeout(&self) -> Duration {
        Duration::from_secs(self.estimate_timeout_secs)
    }
}

/// Plausible grand-total band the price reconciler leaves untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceTextConfig {
    pub plausible_min: u64,
    pub plausible_max: u64,
}

impl Default for PriceTextConfig {
    fn default() -> Self {
        Self {
            plausible_min: 100_000,
            plausible_max: 999_999,
        }
    }
}

// =============================================================================
// Server Settings
// =============================================================================

/// Process-level settings read from the environment
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    /// Carrier Pricing Service base URL; offline fallback when absent
    pub carrier_url: Option<String>,
    pub carrier_token: Option<String>,
    /// Optional JSON file overriding [`EngineConfig`] defaults
    pub engine_config_path: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            carrier_url: None,
            carrier_token: None,
            engine_config_path: None,
        }
    }
}

impl ServerSettings {
    /// Reads `SHIPPING_BIND_ADDR`, `CARRIER_API_URL`, `CARRIER_API_TOKEN` and
    /// `SHIPPING_ENGINE_CONFIG`.
    pub fn from_env() -> anyhow::Result<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match non_empty("SHIPPING_BIND_ADDR") {
            Some(raw) => raw.parse()?,
            None => defaults.bind_addr,
        };

        Ok(Self {
            bind_addr,
            carrier_url: non_empty("CARRIER_API_URL"),
            carrier_token: non_empty("CARRIER_API_TOKEN"),
            engine_config_path: non_empty("SHIPPING_ENGINE_CONFIG").map(PathBuf::from),
        })
    }

    /// Engine configuration: the override file when set, defaults otherwise.
    pub fn load_engine_config(&self) -> Result<EngineConfig, ConfigError> {
        match &self.engine_config_path {
            Some(path) => EngineConfig::from_file(path),
            None => {
                let config = EngineConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }
}
