//! HTTP client for the carrier tariff calculator
//!
//! Maps [`QuoteRequest`] onto `POST {base_url}/calculator/tariff` and the
//! carrier's JSON answer back onto [`CarrierQuote`]. Authentication beyond a
//! static bearer token is handled outside this crate.

use super::models::{CarrierQuote, QuoteRequest};
use super::CarrierPricing;
use crate::engine::models::PriceBasis;
use crate::error::CarrierError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const TARIFF_PATH: &str = "calculator/tariff";

/// Raw tariff calculator answer
#[derive(Debug, Deserialize)]
struct TariffResponse {
    #[serde(default)]
    total_sum: Option<f64>,
    #[serde(default)]
    delivery_sum: Option<f64>,
    #[serde(default)]
    period_min: Option<u32>,
    #[serde(default)]
    period_max: Option<u32>,
    #[serde(default)]
    errors: Vec<TariffErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct TariffErrorEntry {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Carrier client over reqwest
pub struct HttpCarrierClient {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpCarrierClient {
    /// Create a client for `base_url`, bounding every request by `timeout`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, CarrierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("shipping-estimate-rust/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(HttpCarrierClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http_client,
        })
    }

    fn tariff_url(&self) -> String {
        format!("{}/{}", self.base_url, TARIFF_PATH)
    }
}

#[async_trait]
impl CarrierPricing for HttpCarrierClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        let mut builder = self.http_client.post(self.tariff_url()).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CarrierError::Status(status.as_u16()));
        }

        let body: TariffResponse = response.json().await?;
        debug!(tariff = request.tariff_code, ?body, "tariff response");

        if !body.errors.is_empty() {
            let details = body
                .errors
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.as_deref().unwrap_or("?"),
                        e.message.as_deref().unwrap_or("")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            warn!(tariff = request.tariff_code, %details, "carrier reported errors");
        }

        // Request already lists every package, so the carrier total is aggregate
        Ok(CarrierQuote {
            price: body.total_sum.or(body.delivery_sum),
            basis: PriceBasis::Aggregate,
            period_min_days: body.period_min,
            period_max_days: body.period_max,
        })
    }
}
