//! Admission-control middleware behavior over the router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone;
use chrono::Utc;
use tower::ServiceExt;

use atlas_api::AppState;
use atlas_core::auth::service::AuthService;
use atlas_core::clock::{Clock, ManualClock};
use atlas_core::ratelimit::RateLimiter;
use atlas_core::store::memory::MemoryUserStore;

const SECRET: &str = "rate-limit-test-secret-0123456789abcdef";

fn test_app(limit: u32) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryUserStore::new());
    let auth = Arc::new(AuthService::new(
        store,
        clock.clone(),
        SECRET,
        4,
        Duration::from_secs(900),
        Duration::from_secs(7 * 24 * 3600),
    ));
    let limiter = Arc::new(RateLimiter::new(
        limit,
        Duration::from_secs(60),
        clock.clone(),
    ));
    let state = AppState {
        auth,
        limiter,
        clock: clock.clone() as Arc<dyn Clock>,
        started_at: clock.now(),
    };
    (atlas_api::router(state), clock)
}

async fn get_as(app: &Router, client: (&str, &str)) -> axum::http::Response<Body> {
    let (header, value) = client;
    let request = Request::builder()
        .uri("/live")
        .header(header, value)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.expect("request")
}

#[tokio::test]
async fn budget_is_enforced_per_window() {
    let (app, _clock) = test_app(3);

    for expected_remaining in ["2", "1", "0"] {
        let response = get_as(&app, ("x-forwarded-for", "203.0.113.9")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            expected_remaining
        );
        assert_eq!(response.headers()["x-ratelimit-limit"], "3");
        assert!(response.headers().contains_key("x-ratelimit-reset"));
    }

    let rejected = get_as(&app, ("x-forwarded-for", "203.0.113.9")).await;
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(rejected.headers().contains_key("retry-after"));

    let bytes = axum::body::to_bytes(rejected.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn budget_restores_after_the_window() {
    let (app, clock) = test_app(2);

    for _ in 0..2 {
        assert_eq!(
            get_as(&app, ("x-forwarded-for", "203.0.113.9")).await.status(),
            StatusCode::OK
        );
    }
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    clock.advance(chrono::Duration::seconds(61));
    let response = get_as(&app, ("x-forwarded-for", "203.0.113.9")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
}

#[tokio::test]
async fn distinct_clients_do_not_share_budget() {
    let (app, _clock) = test_app(1);

    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // A different forwarded client is unaffected.
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "198.51.100.7")).await.status(),
        StatusCode::OK
    );
    // So is a client identified by X-Real-IP.
    assert_eq!(
        get_as(&app, ("x-real-ip", "192.0.2.4")).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn first_forwarded_entry_identifies_the_client() {
    let (app, _clock) = test_app(1);

    // Both requests resolve to 203.0.113.9 despite differing proxy chains.
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9, 10.0.0.1")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9, 10.0.0.2")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn rejection_happens_before_business_logic() {
    let (app, _clock) = test_app(1);

    // Exhaust the budget with a probe, then try to register: admission must
    // reject it without touching the credential service.
    assert_eq!(
        get_as(&app, ("x-forwarded-for", "203.0.113.9")).await.status(),
        StatusCode::OK
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("x-forwarded-for", "203.0.113.9")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.clone().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
