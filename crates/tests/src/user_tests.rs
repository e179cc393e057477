use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{admin_token, create_court, create_user, get, put_json, test_app};

#[tokio::test]
async fn list_users_is_admin_only() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let (_, user) = create_user(&app.pool, "user@example.com", "user", None).await;

    let (status, _) = get(&app.router, "/api/users", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = get(&app.router, "/api/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 2);
    assert_eq!(resp["meta"]["limit"], 10);
}

#[tokio::test]
async fn list_users_survives_huge_page() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;

    let (status, resp) = get(&app.router, "/api/users?page=9223372036854775807", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 1);
    assert!(resp["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_users_filters_by_role_and_search() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    create_user(&app.pool, "judge.one@court.gov.sa", "judge", None).await;
    create_user(&app.pool, "clerk.one@court.gov.sa", "clerk", None).await;

    let (status, resp) = get(&app.router, "/api/users?role=judge", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["email"], "judge.one@court.gov.sa");

    let (_, resp) = get(&app.router, "/api/users?search=clerk.one", &admin).await;
    assert_eq!(resp["meta"]["total"], 1);

    let (status, _) = get(&app.router, "/api/users?role=emperor", &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_user_self_or_admin() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let (me, token) = create_user(&app.pool, "me@example.com", "user", None).await;
    let (other, _) = create_user(&app.pool, "other@example.com", "user", None).await;

    let (status, resp) = get(&app.router, &format!("/api/users/{me}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["email"], "me@example.com");

    let (status, _) = get(&app.router, &format!("/api/users/{other}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = get(&app.router, &format!("/api/users/{other}"), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, "/api/users/not-a-uuid", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_updates_role_permissions_and_court() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة التجارية").await;
    let (id, token) = create_user(&app.pool, "promote@example.com", "user", None).await;

    let body = json!({
        "role": "clerk",
        "permissions": ["view_analytics"],
        "court_id": court,
    });
    let (status, resp) = put_json(&app.router, &format!("/api/users/{id}"), &body, &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["role"], "clerk");
    assert_eq!(resp["permissions"], json!(["view_analytics"]));
    assert_eq!(resp["court_id"], court.to_string());

    let (_, me) = get(&app.router, "/api/auth/me", &token).await;
    let perms = me["permissions"].as_array().unwrap();
    assert!(perms.contains(&json!("create_case")));
    assert!(perms.contains(&json!("view_analytics")));
}

#[tokio::test]
async fn admin_update_rejects_unknown_values() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let (id, _) = create_user(&app.pool, "x@example.com", "user", None).await;
    let uri = format!("/api/users/{id}");

    let (status, _) = put_json(&app.router, &uri, &json!({"permissions": ["fly"]}), &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) =
        put_json(&app.router, &uri, &json!({"court_id": uuid::Uuid::new_v4()}), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = format!("/api/users/{}", uuid::Uuid::new_v4());
    let (status, _) = put_json(&app.router, &missing, &json!({"role": "judge"}), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_user_token_stops_working() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let (id, token) = create_user(&app.pool, "gone@example.com", "user", None).await;

    let (status, _) =
        put_json(&app.router, &format!("/api/users/{id}"), &json!({"is_active": false}), &admin)
            .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
