//! MCP (Model Context Protocol) route handlers
//!
//! This module implements the Model Context Protocol handlers for the shipping
//! estimate server. It exports `handle_tool_call` publicly to make it
//! accessible for tests.

use super::{helpers::*, models::*};
use crate::shipping::models::{EstimateRequest, EstimateResponse, EstimateStatus, ReconcileRequest};
use crate::shipping::state::{AppState, SharedState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", post(handle_mcp).get(handle_mcp_sse))
        .route("/mcp", post(handle_mcp).get(handle_mcp_sse)) // Standard endpoint
        .route("/mcp/", post(handle_mcp).get(handle_mcp_sse)) // Trailing slash safety
}

/// Handle SSE (Server-Sent Events) handshake for GET requests
async fn handle_mcp_sse() -> impl IntoResponse {
    (
        [("content-type", "text/event-stream")],
        "event: endpoint\ndata: /mcp\n\n",
    )
}

/// Endpoint: POST /mcp
/// Handles the Model Context Protocol communication for POST requests.
async fn handle_mcp(
    State(state): State<SharedState>,
    body: Result<Json<JsonRpcRequest>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(r)) => r,
        Err(e) => {
            warn!(error = %e.body_text(), "JSON-RPC parse error");
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc_error(Value::Null, PARSE_ERROR, "Parse error")),
            )
                .into_response();
        }
    };

    let id = req.id.unwrap_or(Value::Null);
    let method_name = req.method.as_str();
    let params = req.params.unwrap_or(Value::Null);

    info!(method = method_name, ?id, "MCP call");

    let response_body = match method_name {
        "initialize" => rpc_success(id, handle_initialize()),
        "notifications/initialized" => rpc_success(id, json!({})),
        "tools/list" => rpc_success(id, handle_tools_list()),
        "tools/call" => {
            let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
            let args = params.get("arguments").cloned().unwrap_or(Value::Null);

            match handle_tool_call(&state, tool_name, args).await {
                Ok(result) => rpc_success(id, result),
                Err(msg) => rpc_error(id, INVALID_PARAMS, msg),
            }
        }
        "ping" => rpc_success(id, json!({})),
        _ => {
            warn!(method = method_name, "unknown MCP method");
            rpc_error(id, METHOD_NOT_FOUND, "Method not found")
        }
    };

    Json(response_body).into_response()
}

// =============================================================================
// MCP Method Handlers
// =============================================================================

/// Handles `initialize` request (Handshake).
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": true }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Handles `tools/list` request.
fn handle_tools_list() -> Value {
    json!({
        "tools": [
            {
                "name": ESTIMATE_TOOL_NAME,
                "title": "Estimate shipping",
                "description": "Plans packages for the cart and prices delivery to a pickup point, falling back to a local estimate when the carrier cannot price it.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string" },
                                    "quantity": { "type": "integer", "default": 1 },
                                    "unitPrice": { "type": "number" },
                                    "lengthCm": { "type": "number" },
                                    "widthCm": { "type": "number" },
                                    "heightCm": { "type": "number" },
                                    "weightGrams": { "type": "number" }
                                },
                                "additionalProperties": true
                            }
                        },
                        "destination": {
                            "type": "object",
                            "required": ["pointCode"],
                            "properties": {
                                "pointCode": { "type": "string" },
                                "locationCode": { "type": "integer" },
                                "postalCode": { "type": "string" },
                                "city": { "type": "string" }
                            }
                        },
                        "declaredValue": { "type": "number" },
                        "orderTotal": { "type": "number" },
                        "sessionId": { "type": "string" }
                    },
                    "required": ["items", "destination"],
                    "additionalProperties": false
                }
            },
            {
                "name": RECONCILE_TOOL_NAME,
                "title": "Reconcile price text",
                "description": "Repairs a duplicated or concatenated number in rendered price text and returns its value.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" }
                    },
                    "required": ["text"],
                    "additionalProperties": false
                }
            }
        ]
    })
}

/// Handles `tools/call` request (Business Logic).
pub async fn handle_tool_call(state: &AppState, name: &str, args: Value) -> Result<Value, String> {
    match name {
        ESTIMATE_TOOL_NAME => handle_estimate_tool(state, args).await,
        RECONCILE_TOOL_NAME => handle_reconcile_tool(state, args),
        _ => Err(format!("Unknown tool: {}", name)),
    }
}

/// Handles the estimate_shipping tool functionality
async fn handle_estimate_tool(state: &AppState, args: Value) -> Result<Value, String> {
    let input: EstimateRequest =
        serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;

    let response = state
        .run_estimate(input)
        .await
        .map_err(|e| format!("Invalid arguments: {}", e))?;

    let structured = serde_json::to_value(&response).map_err(|e| e.to_string())?;
    Ok(tool_result(estimate_summary(&response), structured))
}

/// Handles the reconcile_price tool functionality
fn handle_reconcile_tool(state: &AppState, args: Value) -> Result<Value, String> {
    let input: ReconcileRequest =
        serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;

    let response = state.reconcile(&input.text);
    let message = if response.changed {
        format!("Repaired \"{}\" to \"{}\".", response.original, response.repaired)
    } else {
        format!("\"{}\" needs no repair.", response.original)
    };

    let structured = serde_json::to_value(&response).map_err(|e| e.to_string())?;
    Ok(tool_result(message, structured))
}

/// One-line description of an estimate for the text content block
fn estimate_summary(response: &EstimateResponse) -> String {
    if response.status == EstimateStatus::Superseded {
        return "Estimate superseded by a newer request.".to_string();
    }

    match (&response.plan, &response.estimate) {
        (Some(plan), Some(estimate)) => {
            let d = plan.dimensions_cm;
            format!(
                "Delivery {}{} for {} package(s) of {}x{}x{} cm.",
                if estimate.source.is_approximate() { "≈" } else { "" },
                estimate.amount,
                plan.package_count,
                d.length,
                d.width,
                d.height
            )
        }
        _ => "No estimate available.".to_string(),
    }
}
