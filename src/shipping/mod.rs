//! Shipping Server Module
//!
//! This module wires the estimation engine into the HTTP server, including:
//! - API models (estimate and reconcile requests/responses)
//! - Application state and per-session request coalescing
//! - REST API handlers

pub mod handlers;
pub mod models;
pub mod state;

// Re-export commonly used types for convenience
pub use handlers::routes;
pub use state::{AppState, SharedState};
