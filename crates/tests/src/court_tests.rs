use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{
    admin_token, case_body, create_case, create_court, create_user, get, get_anonymous,
    post_json, put_json, test_app,
};

fn court_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "name_en": "Riyadh Labor Court",
        "court_type": "labor_court",
        "level": 3,
        "jurisdiction": "labor",
        "city": "الرياض",
        "region": "الرياض",
    })
}

#[tokio::test]
async fn create_court_as_admin() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;

    let (status, resp) =
        post_json(&app.router, "/api/courts", &court_body("المحكمة العمالية"), &admin).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["name"], "المحكمة العمالية");
    assert_eq!(resp["full_name"], "المحكمة العمالية - الرياض");
    assert_eq!(resp["status"], "active");
    assert_eq!(resp["settings"]["judgment_number_format"], "YYYY/####");
}

#[tokio::test]
async fn create_court_rejects_non_admin_and_bad_values() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let (_, judge) = create_user(&app.pool, "judge@court.gov.sa", "judge", None).await;

    let (status, _) = post_json(&app.router, "/api/courts", &court_body("م"), &judge).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut bad = court_body("م");
    bad["court_type"] = json!("space_court");
    let (status, resp) = post_json(&app.router, "/api/courts", &bad, &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["type"].is_string());

    let mut bad_level = court_body("م");
    bad_level["level"] = json!(9);
    let (status, _) = post_json(&app.router, "/api/courts", &bad_level, &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut orphan = court_body("م");
    orphan["parent_court_id"] = json!(uuid::Uuid::new_v4());
    let (status, resp) = post_json(&app.router, "/api/courts", &orphan, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["message"], "المحكمة الأم غير موجودة");
}

#[tokio::test]
async fn list_courts_requires_auth_and_filters() {
    let app = test_app().await;
    let (_, user) = create_user(&app.pool, "u@example.com", "user", None).await;
    create_court(&app.pool, "المحكمة العامة بالرياض").await;
    let closed = create_court(&app.pool, "محكمة مغلقة").await;
    sqlx::query("UPDATE courts SET status = 'inactive' WHERE id = $1")
        .bind(closed)
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, _) = get_anonymous(&app.router, "/api/courts").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, resp) = get(&app.router, "/api/courts", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["meta"]["limit"], 20);

    let (_, resp) = get(&app.router, "/api/courts?status=inactive", &user).await;
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["name"], "محكمة مغلقة");
}

#[tokio::test]
async fn get_court_includes_sub_courts_and_statistics() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let parent = create_court(&app.pool, "محكمة الاستئناف").await;

    let mut child = court_body("المحكمة الفرعية");
    child["parent_court_id"] = json!(parent);
    let (status, _) = post_json(&app.router, "/api/courts", &child, &admin).await;
    assert_eq!(status, StatusCode::CREATED);
    create_case(&app, &admin, case_body(parent, "قضية في محكمة الاستئناف")).await;

    let (status, resp) = get(&app.router, &format!("/api/courts/{parent}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["id"], parent.to_string());
    assert_eq!(resp["sub_courts"].as_array().unwrap().len(), 1);
    assert_eq!(resp["statistics"]["total_cases"], 1);
    assert_eq!(resp["statistics"]["active_cases"], 1);

    let missing = format!("/api/courts/{}", uuid::Uuid::new_v4());
    let (status, _) = get(&app.router, &missing, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_court_as_admin() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "محكمة قديمة").await;
    let uri = format!("/api/courts/{court}");

    let (status, resp) =
        put_json(&app.router, &uri, &json!({"name": "محكمة جديدة", "level": 2}), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["name"], "محكمة جديدة");
    assert_eq!(resp["level"], 2);

    let (status, _) = put_json(&app.router, &uri, &json!({"level": 7}), &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
