use anyhow::Context;
use shipping_estimate_rust::carrier::{CarrierPricing, HttpCarrierClient, OfflineCarrier};
use shipping_estimate_rust::config::ServerSettings;
use shipping_estimate_rust::logging;
use shipping_estimate_rust::router::create_app_router;
use shipping_estimate_rust::shipping::AppState;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let settings = ServerSettings::from_env()?;
    let engine_config = settings
        .load_engine_config()
        .context("loading engine configuration")?;

    // Carrier client: HTTP when configured, offline fallback otherwise
    let carrier: Arc<dyn CarrierPricing> = match &settings.carrier_url {
        Some(url) => {
            info!(%url, "using carrier pricing service");
            Arc::new(HttpCarrierClient::new(
                url,
                settings.carrier_token.clone(),
                engine_config.carrier.request_timeout(),
            )?)
        }
        None => {
            warn!("CARRIER_API_URL not set, every estimate uses the fallback heuristic");
            Arc::new(OfflineCarrier)
        }
    };

    let state = Arc::new(AppState::new(engine_config, carrier));
    let app = create_app_router(state);

    info!(addr = %settings.bind_addr, "server running");

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
