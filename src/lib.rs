//! Shipping Estimate Library
//!
//! This library estimates parcel delivery for a checkout cart: it aggregates
//! line items, plans packages against a carrier's box catalog and size limits,
//! and prices them through the carrier with a local fallback. It also repairs
//! malformed rendered price text. The engine is exposed over REST and MCP.

// Domain modules
pub mod carrier;
pub mod engine;
pub mod mcp;
pub mod shipping;

// Infrastructure
pub mod config;
pub mod error;
pub mod logging;
pub mod router;
