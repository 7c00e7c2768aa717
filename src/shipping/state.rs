//! Shipping Server State
//!
//! Holds the estimation engine and the per-session request coalescer shared by
//! every handler.

use super::models::{EstimateRequest, EstimateResponse, ReconcileResponse};
use crate::carrier::{CarrierPricing, OfflineCarrier};
use crate::config::EngineConfig;
use crate::engine::{EstimationOrchestrator, PriceTextReconciler};
use crate::error::EstimateError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

// =============================================================================
// Request Coalescing
// =============================================================================

/// Claim on the latest estimation slot of one logical key.
///
/// Dropping a ticket that was never completed (the request future was
/// cancelled) releases the slot if no newer request took it.
#[derive(Debug)]
pub struct Ticket {
    key: String,
    generation: u64,
    latest: Arc<DashMap<String, u64>>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let generation = self.generation;
        self.latest.remove_if(&self.key, |_, g| *g == generation);
    }
}

/// Keeps at most one live estimation per key; newer requests supersede older.
///
/// Superseded work is not aborted. Its result is discarded when it completes.
#[derive(Debug, Default)]
pub struct RequestCoalescer {
    /// Latest generation issued per key. DashMap allows concurrent access
    /// without external Mutexes.
    latest: Arc<DashMap<String, u64>>,
    next_generation: AtomicU64,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request for `key`, superseding any pending one.
    pub fn begin(&self, key: &str) -> Ticket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest.insert(key.to_string(), generation);
        Ticket {
            key: key.to_string(),
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// True while no newer request has been registered for the ticket's key.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest
            .get(&ticket.key)
            .map(|g| *g == ticket.generation)
            .unwrap_or(false)
    }

    /// Hands `value` back only if the ticket is still the latest for its key.
    pub fn complete<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        let removed = self
            .latest
            .remove_if(&ticket.key, |_, generation| *generation == ticket.generation);
        if removed.is_some() {
            Some(value)
        } else {
            debug!(key = %ticket.key, generation = ticket.generation, "discarding superseded result");
            None
        }
    }

    /// Number of keys with a request in flight
    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state: the engine plus the coalescer
pub struct AppState {
    pub orchestrator: EstimationOrchestrator,
    pub reconciler: PriceTextReconciler,
    pub coalescer: RequestCoalescer,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Arc::new(OfflineCarrier))
    }
}

impl AppState {
    /// Creates the state around a validated config and a carrier client
    pub fn new(config: EngineConfig, carrier: Arc<dyn CarrierPricing>) -> Self {
        let reconciler = PriceTextReconciler::new(config.price_text.clone());
        Self {
            orchestrator: EstimationOrchestrator::new(Arc::new(config), carrier),
            reconciler,
            coalescer: RequestCoalescer::new(),
        }
    }

    /// Runs one estimate request under the session's coalescing slot.
    pub async fn run_estimate(&self, request: EstimateRequest) -> Result<EstimateResponse, EstimateError> {
        let (session_id, input) = request.into_parts();
        let session_id = get_or_create_session_id(session_id);

        let ticket = self.coalescer.begin(&session_id);
        let result = self.orchestrator.estimate(&input).await;

        match self.coalescer.complete(ticket, result) {
            Some(result) => Ok(EstimateResponse::estimated(session_id, result?)),
            None => Ok(EstimateResponse::superseded(session_id)),
        }
    }

    /// Repairs rendered price text and extracts its value.
    pub fn reconcile(&self, text: &str) -> ReconcileResponse {
        let repaired = self.reconciler.repair(text);
        ReconcileResponse {
            original: text.to_string(),
            value: self.reconciler.extract_numeric(text),
            changed: repaired != text,
            repaired,
        }
    }
}

/// Returns the provided `session_id` or creates a new UUID string when `None`.
///
/// This guarantees that every estimate works with a non-empty coalescing key.
pub fn get_or_create_session_id(session_id: Option<String>) -> String {
    session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let coalescer = RequestCoalescer::new();
        let older = coalescer.begin("session-1");
        let newer = coalescer.begin("session-1");

        assert!(!coalescer.is_current(&older));
        assert!(coalescer.is_current(&newer));

        assert_eq!(coalescer.complete(older, "old"), None);
        assert_eq!(coalescer.complete(newer, "new"), Some("new"));
        assert_eq!(coalescer.pending(), 0);
    }

    #[test]
    fn late_result_after_restart_is_still_discarded() {
        let coalescer = RequestCoalescer::new();
        let first = coalescer.begin("s");
        let second = coalescer.begin("s");
        assert_eq!(coalescer.complete(second, 2), Some(2));

        // A fresh request starts after the winner finished; the stale one must
        // not be mistaken for it.
        let third = coalescer.begin("s");
        assert_eq!(coalescer.complete(first, 1), None);
        assert_eq!(coalescer.complete(third, 3), Some(3));
    }

    #[test]
    fn dropped_ticket_releases_its_slot() {
        let coalescer = RequestCoalescer::new();
        let ticket = coalescer.begin("abandoned");
        assert_eq!(coalescer.pending(), 1);
        drop(ticket);
        assert_eq!(coalescer.pending(), 0);
    }

    #[test]
    fn dropped_stale_ticket_keeps_newer_slot() {
        let coalescer = RequestCoalescer::new();
        let older = coalescer.begin("s");
        let newer = coalescer.begin("s");
        drop(older);
        assert!(coalescer.is_current(&newer));
        assert_eq!(coalescer.complete(newer, "new"), Some("new"));
        assert_eq!(coalescer.pending(), 0);
    }

    #[test]
    fn keys_are_independent() {
        let coalescer = RequestCoalescer::new();
        let a = coalescer.begin("a");
        let b = coalescer.begin("b");
        assert_eq!(coalescer.pending(), 2);
        assert_eq!(coalescer.complete(a, ()), Some(()));
        assert_eq!(coalescer.complete(b, ()), Some(()));
    }

    #[test]
    fn session_id_is_generated_when_blank() {
        assert_eq!(get_or_create_session_id(Some("abc".into())), "abc");
        assert_eq!(get_or_create_session_id(Some("  ".into())).len(), 32);
        assert_eq!(get_or_create_session_id(None).len(), 32);
    }

    #[test]
    fn reconcile_reports_change() {
        let state = AppState::default();
        let response = state.reconcile("180180 ₽");
        assert_eq!(response.repaired, "180 ₽");
        assert_eq!(response.value, 180.0);
        assert!(response.changed);

        let untouched = state.reconcile("135000 ₽");
        assert!(!untouched.changed);
        assert_eq!(untouched.value, 135000.0);
    }
}
