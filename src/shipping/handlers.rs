//! REST API handlers for shipping estimation
//!
//! This module implements HTTP endpoints for cart estimation and price text
//! reconciliation.

use super::{models::*, state::SharedState};
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, response::Response, routing::post,
    Json, Router,
};
use tracing::{info, warn};

/// Creates routes for shipping-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/estimate", post(estimate))
        .route("/reconcile_price", post(reconcile_price))
}

/// Endpoint: POST /estimate
/// Aggregates, plans and prices the posted cart.
async fn estimate(State(state): State<SharedState>, Json(payload): Json<EstimateRequest>) -> Response {
    match state.run_estimate(payload).await {
        Ok(response) if response.status == EstimateStatus::Superseded => {
            info!(session = %response.session_id, "estimate superseded by newer request");
            (StatusCode::CONFLICT, Json(response)).into_response()
        }
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            warn!(error = %err, "rejected estimate request");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Endpoint: POST /reconcile_price
/// Repairs duplicated or concatenated numbers in rendered price text.
async fn reconcile_price(
    State(state): State<SharedState>,
    Json(payload): Json<ReconcileRequest>,
) -> impl IntoResponse {
    Json(state.reconcile(&payload.text))
}
