//! End-to-end checks over the public crate surface that do not need a
//! database: OpenAPI document shape, rate limiter behavior through the
//! exported types, and session claim serialization.

use nimbus::api::handlers::auth::{Claims, CounterStore, FixedWindowLimiter};
use nimbus::api::openapi;

#[test]
fn openapi_document_covers_every_endpoint() {
    let spec = openapi();
    let paths = &spec.paths.paths;
    let keys: Vec<&String> = paths.keys().collect();
    assert_eq!(paths.len(), 8, "unexpected endpoint count: {keys:?}");
    for path in [
        "/register",
        "/verify-email",
        "/resend-verification",
        "/request-reset",
        "/reset-password",
        "/login",
        "/providers",
        "/health",
    ] {
        assert!(paths.contains_key(path), "missing path: {path}");
    }
}

#[tokio::test]
async fn limiter_admits_three_per_window_then_denies() {
    let limiter = FixedWindowLimiter::new(CounterStore::memory());
    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs();

    let mut allowed = Vec::new();
    let mut last_remaining = u32::MAX;
    let mut last_reset_at = 0;
    for _ in 0..4 {
        let verdict = limiter
            .check("resend-verification:alice@example.com", 3, 3600)
            .await
            .expect("memory store never fails");
        allowed.push(verdict.allowed);
        last_remaining = verdict.remaining;
        last_reset_at = verdict.reset_at;
    }

    assert_eq!(allowed, [true, true, true, false]);
    assert_eq!(last_remaining, 0);
    assert!(last_reset_at >= before);
    assert!(last_reset_at <= before + 3601);
}

#[test]
fn claims_json_shape_is_stable() {
    let claims = Claims {
        id: "00000000-0000-0000-0000-000000000000".to_string(),
        name: Some("Alice".to_string()),
        email: Some("alice@example.com".to_string()),
        picture: None,
        username: None,
    };
    let value = serde_json::to_value(&claims).expect("claims serialize");
    let object = value.as_object().expect("claims are an object");
    assert_eq!(object.len(), 5);
    for key in ["id", "name", "email", "picture", "username"] {
        assert!(object.contains_key(key), "missing claim field: {key}");
    }
    assert!(object["picture"].is_null());
}
