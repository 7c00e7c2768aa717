//! Carrier Pricing Service request and response models

use crate::engine::models::PriceBasis;
use serde::{Deserialize, Serialize};

/// How a destination is identified to the carrier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationRef {
    /// Carrier location code
    Code(u32),
    PostalCode(String),
    City(String),
}

/// One physical package as the carrier sees it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Grams
    pub weight: u32,
    /// Centimetres
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

/// A single tariff calculation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRequest {
    pub tariff_code: u32,
    pub from_location: LocationRef,
    pub to_location: LocationRef,
    pub packages: Vec<PackageDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insured_value: Option<f64>,
}

/// What the carrier answered
#[derive(Debug, Clone, PartialEq)]
pub struct CarrierQuote {
    /// Raw price; missing or non-positive means "no usable price"
    pub price: Option<f64>,
    /// Whether `price` already covers every package in the request
    pub basis: PriceBasis,
    pub period_min_days: Option<u32>,
    pub period_max_days: Option<u32>,
}

impl CarrierQuote {
    /// Aggregate quote with no delivery period
    pub fn aggregate(price: f64) -> Self {
        Self {
            price: Some(price),
            basis: PriceBasis::Aggregate,
            period_min_days: None,
            period_max_days: None,
        }
    }

    /// Carrier answered but had nothing to offer
    pub fn empty() -> Self {
        Self {
            price: None,
            basis: PriceBasis::Aggregate,
            period_min_days: None,
            period_max_days: None,
        }
    }

    pub fn with_period(mut self, min_days: u32, max_days: u32) -> Self {
        self.period_min_days = Some(min_days);
        self.period_max_days = Some(max_days);
        self
    }

    /// Finite positive price, if any
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_positive_prices_are_unusable() {
        assert_eq!(CarrierQuote::aggregate(0.0).usable_price(), None);
        assert_eq!(CarrierQuote::aggregate(-5.0).usable_price(), None);
        assert_eq!(CarrierQuote::aggregate(f64::NAN).usable_price(), None);
        assert_eq!(CarrierQuote::empty().usable_price(), None);
        assert_eq!(CarrierQuote::aggregate(412.5).usable_price(), Some(412.5));
    }

    #[test]
    fn request_serializes_location_variants() {
        let request = QuoteRequest {
            tariff_code: 136,
            from_location: LocationRef::Code(44),
            to_location: LocationRef::PostalCode("620000".into()),
            packages: vec![PackageDescriptor {
                weight: 1000,
                length: 32,
                width: 21,
                height: 16,
            }],
            insured_value: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["from_location"], json!({ "code": 44 }));
        assert_eq!(value["to_location"], json!({ "postal_code": "620000" }));
        assert!(value.get("insured_value").is_none());
    }
}
