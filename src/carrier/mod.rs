//! Carrier Pricing Service Module
//!
//! The estimator talks to the carrier only through [`CarrierPricing`]:
//! - `HttpCarrierClient` calls the real tariff calculator
//! - `OfflineCarrier` stands in when no endpoint is configured

pub mod http;
pub mod models;

use crate::error::CarrierError;
use async_trait::async_trait;
use models::{CarrierQuote, QuoteRequest};

pub use http::HttpCarrierClient;

/// Tariff calculation against the carrier.
///
/// Implementations report transport and decoding failures as
/// [`CarrierError`]; an answer without a usable price is an `Ok` quote whose
/// price is missing or non-positive.
#[async_trait]
pub trait CarrierPricing: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<CarrierQuote, CarrierError>;
}

/// Carrier that is never reachable; every estimate falls back locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCarrier;

#[async_trait]
impl CarrierPricing for OfflineCarrier {
    async fn quote(&self, _request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        Err(CarrierError::Unavailable)
    }
}
