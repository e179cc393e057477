use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{
    create_court, create_user, get, get_anonymous, post_anonymous, post_json, put_json, test_app,
    TEST_PASSWORD,
};

#[tokio::test]
async fn register_defaults_to_user_role() {
    let app = test_app().await;

    let body = json!({
        "name": "محمد العتيبي",
        "email": "Mohammed@Example.com",
        "password": "secret1",
    });
    let (status, resp) = post_anonymous(&app.router, "/api/auth/register", &body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["user"]["email"], "mohammed@example.com");
    assert_eq!(resp["user"]["role"], "user");
    assert_eq!(resp["user"]["preferences"]["language"], "ar");
    assert_eq!(resp["permissions"], json!(["view_case", "view_judgment"]));
    assert!(resp["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(resp["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_duplicate_email_400() {
    let app = test_app().await;
    let body = json!({"name": "أ", "email": "dup@example.com", "password": "secret1"});

    let (status, _) = post_anonymous(&app.router, "/api/auth/register", &body).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, resp) = post_anonymous(&app.router, "/api/auth/register", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "المستخدم موجود بالفعل");
}

#[tokio::test]
async fn register_validation_failures() {
    let app = test_app().await;

    let short_password = json!({"name": "أ", "email": "a@example.com", "password": "123"});
    let (status, resp) = post_anonymous(&app.router, "/api/auth/register", &short_password).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["password"].is_string());

    let bad_role = json!({"name": "أ", "email": "b@example.com", "password": "secret1", "role": "king"});
    let (status, resp) = post_anonymous(&app.router, "/api/auth/register", &bad_role).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["role"].is_string());
}

#[tokio::test]
async fn privileged_roles_need_an_admin_caller() {
    let app = test_app().await;
    let body = json!({"name": "قاض", "email": "judge@example.com", "password": "secret1", "role": "judge"});

    let (status, _) = post_anonymous(&app.router, "/api/auth/register", &body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin) = create_user(&app.pool, "admin@court.gov.sa", "admin", None).await;
    let (status, resp) = post_json(&app.router, "/api/auth/register", &body, &admin).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["user"]["role"], "judge");
}

#[tokio::test]
async fn register_with_unknown_court_404() {
    let app = test_app().await;
    let body = json!({
        "name": "أ",
        "email": "c@example.com",
        "password": "secret1",
        "court_id": uuid::Uuid::new_v4(),
    });
    let (status, _) = post_anonymous(&app.router, "/api/auth/register", &body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_success_and_me() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;

    let body = json!({"email": "CLERK@court.gov.sa", "password": TEST_PASSWORD});
    let (status, resp) = post_anonymous(&app.router, "/api/auth/login", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(resp["user"]["last_login"].is_string());
    let token = resp["token"].as_str().unwrap().to_string();

    let (status, me) = get(&app.router, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "clerk@court.gov.sa");
    assert_eq!(me["user"]["court_id"], court.to_string());
    let perms = me["permissions"].as_array().unwrap();
    assert!(perms.contains(&json!("create_case")));
    assert!(!perms.contains(&json!("delete_case")));
}

#[tokio::test]
async fn login_failures_are_401() {
    let app = test_app().await;
    create_user(&app.pool, "user@example.com", "user", None).await;

    let (status, resp) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "nobody@example.com", "password": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "بيانات الدخول غير صحيحة");

    let (status, _) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "user@example.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "", "password": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn five_failures_lock_the_account() {
    let app = test_app().await;
    create_user(&app.pool, "locked@example.com", "user", None).await;

    for _ in 0..5 {
        let (status, _) = post_anonymous(
            &app.router,
            "/api/auth/login",
            &json!({"email": "locked@example.com", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, resp) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "locked@example.com", "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(resp["message"].as_str().unwrap().contains("مقفل"));
}

#[tokio::test]
async fn inactive_account_cannot_log_in() {
    let app = test_app().await;
    let (id, _) = create_user(&app.pool, "inactive@example.com", "user", None).await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, resp) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "inactive@example.com", "password": TEST_PASSWORD}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "الحساب غير مفعل");
}

#[tokio::test]
async fn me_requires_a_token() {
    let app = test_app().await;
    let (status, _) = get_anonymous(&app.router, "/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app.router, "/api/auth/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = test_app().await;
    let (_, token) = create_user(&app.pool, "out@example.com", "user", None).await;

    let (status, _) = post_json(&app.router, "/api/auth/logout", &json!({}), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app.router, "/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_profile_and_preferences() {
    let app = test_app().await;
    let (_, token) = create_user(&app.pool, "lawyer@example.com", "lawyer", None).await;

    let body = json!({
        "name": "سارة المحامية",
        "profile": {"phone": "+966500000000", "specialization": ["تجاري"]},
        "preferences": {"language": "en", "theme": "dark"},
    });
    let (status, resp) = put_json(&app.router, "/api/auth/profile", &body, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["name"], "سارة المحامية");
    assert_eq!(resp["profile"]["phone"], "+966500000000");
    assert_eq!(resp["preferences"]["language"], "en");
    assert_eq!(resp["preferences"]["theme"], "dark");
    assert_eq!(resp["preferences"]["date_format"], "hijri");

    let bad = json!({"preferences": {"theme": "neon"}});
    let (status, _) = put_json(&app.router, "/api/auth/profile", &bad, &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn change_password_checks_current() {
    let app = test_app().await;
    let (_, token) = create_user(&app.pool, "pw@example.com", "user", None).await;

    let wrong = json!({"current_password": "nope", "new_password": "another1"});
    let (status, _) = put_json(&app.router, "/api/auth/change-password", &wrong, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let ok = json!({"current_password": TEST_PASSWORD, "new_password": "another1"});
    let (status, _) = put_json(&app.router, "/api/auth/change-password", &ok, &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_anonymous(
        &app.router,
        "/api/auth/login",
        &json!({"email": "pw@example.com", "password": "another1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
