use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use server::rate_limit::RateLimitState;

use crate::common::{get_anonymous, send, test_app, test_app_with_limiter};

#[tokio::test]
async fn health_reports_database() {
    let app = test_app().await;

    let (status, resp) = get_anonymous(&app.router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "OK");
    assert_eq!(resp["db"], "connected");
    assert!(resp["version"].is_string());
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = test_app().await;

    let (status, resp) = get_anonymous(&app.router, "/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["kind"], "NotFound");
    assert_eq!(resp["message"], "المسار المطلوب غير موجود");
}

#[tokio::test]
async fn bad_bearer_token_is_rejected() {
    let app = test_app().await;
    let req = Request::builder()
        .uri("/api/auth/me")
        .header("authorization", "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();

    let (status, resp) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["kind"], "Unauthorized");
}

#[tokio::test]
async fn rate_limit_returns_429_per_client() {
    let limiter = RateLimitState::new(2, Duration::from_secs(60));
    let app = test_app_with_limiter(Some(limiter)).await;

    let from = |ip: &str| {
        Request::builder()
            .uri("/api/health")
            .header("x-forwarded-for", format!("{ip}, 10.0.0.1"))
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app.router, from("203.0.113.7")).await.0, StatusCode::OK);
    assert_eq!(send(&app.router, from("203.0.113.7")).await.0, StatusCode::OK);

    let (status, resp) = send(&app.router, from("203.0.113.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp["kind"], "RateLimited");

    assert_eq!(send(&app.router, from("198.51.100.2")).await.0, StatusCode::OK);
}
