//! End-to-end estimation tests against fake carriers
//!
//! Covers the tiered pricing fallback, per-session superseding and
//! independence of concurrent estimations.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::join_all;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::util::ServiceExt;

use shipping_estimate_rust::carrier::models::{CarrierQuote, QuoteRequest};
use shipping_estimate_rust::carrier::CarrierPricing;
use shipping_estimate_rust::config::EngineConfig;
use shipping_estimate_rust::engine::models::{CostSource, DestinationPoint, Dimensions, LineItem};
use shipping_estimate_rust::error::CarrierError;
use shipping_estimate_rust::router::create_app_router;
use shipping_estimate_rust::shipping::models::{EstimateRequest, EstimateStatus};
use shipping_estimate_rust::shipping::AppState;

/// Carrier that fails every call
struct BrokenCarrier;

#[async_trait]
impl CarrierPricing for BrokenCarrier {
    async fn quote(&self, _request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        Err(CarrierError::Http("connection refused".into()))
    }
}

/// Carrier pricing 100 per package on every tariff
struct FlatCarrier;

#[async_trait]
impl CarrierPricing for FlatCarrier {
    async fn quote(&self, request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        Ok(CarrierQuote::aggregate(100.0 * request.packages.len() as f64).with_period(1, 3))
    }
}

/// Holds the first call until released; later calls answer at once
#[derive(Default)]
struct GatedCarrier {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl CarrierPricing for GatedCarrier {
    async fn quote(&self, _request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(CarrierQuote::aggregate(500.0))
    }
}

fn request(session: &str, items: Vec<LineItem>, point: &str) -> EstimateRequest {
    EstimateRequest {
        items,
        destination: DestinationPoint::new(point),
        declared_value: None,
        order_total: None,
        session_id: Some(session.to_string()),
    }
}

fn kettle() -> LineItem {
    LineItem::new(1, 2000.0, Dimensions::new(30.0, 20.0, 15.0), 1000.0)
}

#[tokio::test]
async fn broken_carrier_always_falls_back() {
    let state = AppState::new(EngineConfig::default(), Arc::new(BrokenCarrier));

    let carts = vec![
        vec![kettle()],
        vec![],
        vec![LineItem::new(300, 50.0, Dimensions::new(5.0, 5.0, 5.0), 20.0)],
        vec![LineItem::new(4, 900.0, Dimensions::new(140.0, 80.0, 60.0), 9000.0)],
    ];

    for (i, items) in carts.into_iter().enumerate() {
        let response = state
            .run_estimate(request(&format!("s{i}"), items, "ZZZ404"))
            .await
            .expect("valid input never errors");
        let estimate = response.estimate.expect("estimate present");
        assert_eq!(estimate.source, CostSource::FallbackHeuristic);
        assert!(estimate.amount >= 350);
    }
}

#[tokio::test]
async fn carrier_price_is_reported_as_confirmed() {
    let state = AppState::new(EngineConfig::default(), Arc::new(FlatCarrier));
    let response = state
        .run_estimate(request("s", vec![kettle()], "MSK1"))
        .await
        .unwrap();

    assert_eq!(response.approximate, Some(false));
    let estimate = response.estimate.unwrap();
    assert_eq!(estimate.source, CostSource::Api);
    assert_eq!(estimate.amount, 100);
    assert_eq!(estimate.period_max_days, Some(3));
}

#[tokio::test]
async fn newer_request_supersedes_pending_one() {
    let carrier = Arc::new(GatedCarrier::default());
    let state = Arc::new(AppState::new(EngineConfig::default(), carrier.clone()));

    let first = tokio::spawn({
        let state = state.clone();
        async move { state.run_estimate(request("checkout", vec![kettle()], "MSK1")).await }
    });
    carrier.entered.notified().await;

    let second = state
        .run_estimate(request("checkout", vec![kettle()], "SPB2"))
        .await
        .unwrap();
    assert_eq!(second.status, EstimateStatus::Estimated);

    carrier.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status, EstimateStatus::Superseded);
    assert!(first.estimate.is_none());
    assert_eq!(state.coalescer.pending(), 0);
}

/// Never answers
struct HangingCarrier;

#[async_trait]
impl CarrierPricing for HangingCarrier {
    async fn quote(&self, _request: &QuoteRequest) -> Result<CarrierQuote, CarrierError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_requests_release_their_sessions() {
    let state = AppState::new(EngineConfig::default(), Arc::new(HangingCarrier));

    for session in ["left-1", "left-2", "left-3"] {
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            state.run_estimate(request(session, vec![kettle()], "MSK1")),
        )
        .await;
        assert!(outcome.is_err(), "{session} should still be waiting on the carrier");
    }

    assert_eq!(state.coalescer.pending(), 0);
}

#[tokio::test]
async fn superseded_rest_request_gets_conflict() {
    let carrier = Arc::new(GatedCarrier::default());
    let app = create_app_router(Arc::new(AppState::new(EngineConfig::default(), carrier.clone())));

    let post = |point: &str| {
        let body = json!({
            "items": [{ "quantity": 1, "unitPrice": 100, "lengthCm": 10, "widthCm": 10, "heightCm": 10, "weightGrams": 300 }],
            "destination": { "pointCode": point },
            "sessionId": "rest-checkout"
        });
        Request::builder()
            .method("POST")
            .uri("/estimate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let first = tokio::spawn(app.clone().oneshot(post("MSK1")));
    carrier.entered.notified().await;

    let second = app.clone().oneshot(post("MSK2")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    carrier.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(first.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "superseded");
}

#[tokio::test]
async fn concurrent_sessions_do_not_interfere() {
    let state = Arc::new(AppState::new(EngineConfig::default(), Arc::new(FlatCarrier)));

    let runs = (1..=20u32).map(|n| {
        let state = state.clone();
        async move {
            let items = vec![LineItem::new(n, 100.0, Dimensions::new(40.0, 30.0, 20.0), 500.0)];
            let response = state
                .run_estimate(request(&format!("session-{n}"), items, "KZN9"))
                .await
                .unwrap();
            (n, response)
        }
    });

    for (n, response) in join_all(runs).await {
        assert_eq!(response.status, EstimateStatus::Estimated, "session {n}");
        let plan = response.plan.unwrap();
        let estimate = response.estimate.unwrap();
        assert_eq!(estimate.amount, 100 * u64::from(plan.package_count));
        assert_eq!(response.totals.unwrap().item_count, n);
    }
    assert_eq!(state.coalescer.pending(), 0);
}

#[tokio::test]
async fn identical_inputs_give_identical_outputs() {
    let state = AppState::new(EngineConfig::default(), Arc::new(BrokenCarrier));
    let items = vec![
        kettle(),
        LineItem::new(3, 450.0, Dimensions::new(12.0, 12.0, 40.0), 700.0),
    ];

    let first = state
        .run_estimate(request("a", items.clone(), "NN3"))
        .await
        .unwrap();
    let second = state.run_estimate(request("a", items, "NN3")).await.unwrap();

    assert_eq!(first.plan, second.plan);
    assert_eq!(first.estimate, second.estimate);
    assert_eq!(first.totals, second.totals);
}
