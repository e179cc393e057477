use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{
    admin_token, case_body, create_case, create_court, create_user, delete, get, post_json,
    put_json, test_app,
};

fn events(detail: &Value) -> Vec<String> {
    detail["timeline"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn clerk_creates_numbered_case() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة التجارية").await;
    let (clerk_id, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;

    let first = create_case(&app, &clerk, case_body(court, "نزاع توريد")).await;
    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(first["case_number"], format!("{year}/0001"));
    assert_eq!(first["status"], "registered");
    assert_eq!(first["priority"], "normal");
    assert_eq!(first["confidentiality_level"], "restricted");
    assert_eq!(first["court"]["id"], court.to_string());
    assert_eq!(first["clerk"]["id"], clerk_id.to_string());

    let second = create_case(&app, &clerk, case_body(court, "نزاع إيجار")).await;
    assert_eq!(second["case_number"], format!("{year}/0002"));

    let (status, detail) =
        get(&app.router, &format!("/api/cases/{}", first["id"].as_str().unwrap()), &clerk).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events(&detail), vec!["case_created"]);
}

#[tokio::test]
async fn create_case_rejects_bad_input() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let other = create_court(&app.pool, "محكمة أخرى").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let (_, user) = create_user(&app.pool, "user@example.com", "user", Some(court)).await;

    let mut bad_type = case_body(court, "قضية");
    bad_type["case_type"] = json!("piracy");
    let (status, resp) = post_json(&app.router, "/api/cases", &bad_type, &clerk).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");

    let (status, _) = post_json(&app.router, "/api/cases", &case_body(court, ""), &clerk).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing = case_body(uuid::Uuid::new_v4(), "قضية");
    let (status, _) = post_json(&app.router, "/api/cases", &missing, &clerk).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(&app.router, "/api/cases", &case_body(other, "قضية"), &clerk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(&app.router, "/api/cases", &case_body(court, "قضية"), &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_is_scoped_by_role() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (judge_id, judge) = create_user(&app.pool, "judge@court.gov.sa", "judge", Some(court)).await;
    let (_, clerk_a) = create_user(&app.pool, "a@court.gov.sa", "clerk", Some(court)).await;
    let (_, clerk_b) = create_user(&app.pool, "b@court.gov.sa", "clerk", Some(court)).await;
    let (_, member) = create_user(&app.pool, "member@example.com", "user", Some(court)).await;
    let (_, outsider) = create_user(&app.pool, "outsider@example.com", "user", None).await;

    create_case(&app, &clerk_a, case_body(court, "قضية الكاتب أ")).await;
    let mut assigned = case_body(court, "قضية القاضي");
    assigned["judge_id"] = json!(judge_id);
    assigned["confidentiality_level"] = json!("public");
    create_case(&app, &admin, assigned).await;

    let total = |resp: &Value| resp["meta"]["total"].as_i64().unwrap();

    let (_, resp) = get(&app.router, "/api/cases", &admin).await;
    assert_eq!(total(&resp), 2);

    let (_, resp) = get(&app.router, "/api/cases", &judge).await;
    assert_eq!(total(&resp), 1);
    assert_eq!(resp["data"][0]["title"], "قضية القاضي");

    let (_, resp) = get(&app.router, "/api/cases", &clerk_a).await;
    assert_eq!(total(&resp), 1);
    assert_eq!(resp["data"][0]["title"], "قضية الكاتب أ");

    let (_, resp) = get(&app.router, "/api/cases", &clerk_b).await;
    assert_eq!(total(&resp), 0);

    let (_, resp) = get(&app.router, "/api/cases", &member).await;
    assert_eq!(total(&resp), 2);

    let (_, resp) = get(&app.router, "/api/cases", &outsider).await;
    assert_eq!(total(&resp), 1);
    assert_eq!(resp["data"][0]["confidentiality_level"], "public");
}

#[tokio::test]
async fn list_filters_and_search() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;

    create_case(&app, &admin, case_body(court, "نزاع توريد إسمنت")).await;
    let mut labor = case_body(court, "فصل تعسفي");
    labor["case_type"] = json!("labor");
    labor["priority"] = json!("urgent");
    create_case(&app, &admin, labor).await;

    let (status, resp) = get(&app.router, "/api/cases?type=labor", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["title"], "فصل تعسفي");

    let (_, resp) = get(&app.router, "/api/cases?priority=urgent", &admin).await;
    assert_eq!(resp["meta"]["total"], 1);

    let (_, resp) = get(&app.router, "/api/cases?search=%D8%A5%D8%B3%D9%85%D9%86%D8%AA", &admin).await;
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["title"], "نزاع توريد إسمنت");

    let (_, resp) = get(&app.router, "/api/cases?limit=1&page=2", &admin).await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);
    assert_eq!(resp["meta"]["has_prev"], true);
    assert_eq!(resp["meta"]["has_next"], false);

    let (status, _) = get(&app.router, "/api/cases?status=lost", &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn case_visibility_on_get() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk_a) = create_user(&app.pool, "a@court.gov.sa", "clerk", Some(court)).await;
    let (_, clerk_b) = create_user(&app.pool, "b@court.gov.sa", "clerk", None).await;

    let case = create_case(&app, &clerk_a, case_body(court, "قضية خاصة")).await;
    let uri = format!("/api/cases/{}", case["id"].as_str().unwrap());

    let (status, _) = get(&app.router, &uri, &clerk_b).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/api/cases/{}", uuid::Uuid::new_v4());
    let (status, _) = get(&app.router, &missing, &clerk_a).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_records_status_change() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk_a) = create_user(&app.pool, "a@court.gov.sa", "clerk", Some(court)).await;
    let (_, clerk_b) = create_user(&app.pool, "b@court.gov.sa", "clerk", Some(court)).await;

    let case = create_case(&app, &clerk_a, case_body(court, "قضية")).await;
    let uri = format!("/api/cases/{}", case["id"].as_str().unwrap());

    let body = json!({"title": "قضية معدلة", "status": "under_review"});
    let (status, _) = put_json(&app.router, &uri, &body, &clerk_b).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = put_json(&app.router, &uri, &body, &clerk_a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["title"], "قضية معدلة");
    assert_eq!(resp["status"], "under_review");

    let (_, detail) = get(&app.router, &uri, &clerk_a).await;
    assert_eq!(events(&detail), vec!["case_created", "status_change", "case_updated"]);
    assert_eq!(
        detail["timeline"][1]["description"],
        "تم تغيير حالة القضية من registered إلى under_review"
    );

    let (status, _) = put_json(&app.router, &uri, &json!({"priority": "extreme"}), &clerk_a).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_endpoint_appends_note() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let case = create_case(&app, &admin, case_body(court, "قضية")).await;
    let uri = format!("/api/cases/{}/status", case["id"].as_str().unwrap());

    let (status, resp) = put_json(
        &app.router,
        &uri,
        &json!({"status": "scheduled", "note": "حددت الجلسة الأولى"}),
        &admin,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "scheduled");

    let (_, detail) =
        get(&app.router, &format!("/api/cases/{}", case["id"].as_str().unwrap()), &admin).await;
    let last = detail["timeline"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["event"], "status_change");
    assert!(last["description"].as_str().unwrap().ends_with("حددت الجلسة الأولى"));

    let (status, _) = put_json(&app.router, &uri, &json!({"status": "vanished"}), &admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn sessions_are_numbered() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let case = create_case(&app, &clerk, case_body(court, "قضية")).await;
    let uri = format!("/api/cases/{}/sessions", case["id"].as_str().unwrap());

    let session = json!({
        "date": "2025-04-10T09:00:00Z",
        "session_type": "hearing",
        "attendees": ["المدعي", "المدعى عليه"],
    });
    let (status, resp) = post_json(&app.router, &uri, &session, &clerk).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["sessions"][0]["session_number"], 1);
    assert_eq!(resp["sessions"][0]["type"], "hearing");
    assert_eq!(resp["sessions"][0]["status"], "scheduled");
    assert!(resp["last_session"].as_str().unwrap().starts_with("2025-04-10"));

    let (status, resp) = post_json(&app.router, &uri, &session, &clerk).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["sessions"][1]["session_number"], 2);

    let mut bad = session.clone();
    bad["session_type"] = json!("picnic");
    let (status, _) = post_json(&app.router, &uri, &bad, &clerk).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_is_admin_only_and_blocked_when_final() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;

    let open = create_case(&app, &clerk, case_body(court, "قضية مفتوحة")).await;
    let open_uri = format!("/api/cases/{}", open["id"].as_str().unwrap());
    let (status, _) = delete(&app.router, &open_uri, &clerk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let closed = create_case(&app, &admin, case_body(court, "قضية نهائية")).await;
    let closed_id = closed["id"].as_str().unwrap();
    put_json(
        &app.router,
        &format!("/api/cases/{closed_id}/status"),
        &json!({"status": "final"}),
        &admin,
    )
    .await;
    let (status, _) = delete(&app.router, &format!("/api/cases/{closed_id}"), &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resp) = delete(&app.router, &open_uri, &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "تم حذف القضية بنجاح");

    let (status, _) = get(&app.router, &open_uri, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn numbers_are_not_reused_after_delete() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let year = chrono::Utc::now().format("%Y").to_string();

    let first = create_case(&app, &admin, case_body(court, "أولى")).await;
    create_case(&app, &admin, case_body(court, "ثانية")).await;
    let (status, _) =
        delete(&app.router, &format!("/api/cases/{}", first["id"].as_str().unwrap()), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let third = create_case(&app, &admin, case_body(court, "ثالثة")).await;
    assert_eq!(third["case_number"], format!("{year}/0003"));
    let fourth = create_case(&app, &admin, case_body(court, "رابعة")).await;
    assert_eq!(fourth["case_number"], format!("{year}/0004"));

    // Another court keeps its own sequence.
    let other = create_court(&app.pool, "المحكمة الجزائية").await;
    let elsewhere = create_case(&app, &admin, case_body(other, "أولى")).await;
    assert_eq!(elsewhere["case_number"], format!("{year}/0001"));
}

#[tokio::test]
async fn concurrent_creates_get_distinct_numbers() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (a, b) = (case_body(court, "متزامنة أ"), case_body(court, "متزامنة ب"));

    let ((status_a, resp_a), (status_b, resp_b)) = tokio::join!(
        post_json(&app.router, "/api/cases", &a, &admin),
        post_json(&app.router, "/api/cases", &b, &admin),
    );
    assert_eq!(status_a, StatusCode::CREATED, "{resp_a}");
    assert_eq!(status_b, StatusCode::CREATED, "{resp_b}");
    assert_ne!(resp_a["case_number"], resp_b["case_number"]);
}

#[tokio::test]
async fn huge_page_returns_empty_list() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    create_case(&app, &admin, case_body(court, "قضية")).await;

    let (status, resp) =
        get(&app.router, "/api/cases?page=9223372036854775807&limit=100", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["page"], 10_000);
    assert_eq!(resp["meta"]["total"], 1);
    assert!(resp["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn statistics_follow_scope() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;

    create_case(&app, &clerk, case_body(court, "أولى")).await;
    let decided = create_case(&app, &admin, case_body(court, "ثانية")).await;
    put_json(
        &app.router,
        &format!("/api/cases/{}/status", decided["id"].as_str().unwrap()),
        &json!({"status": "decided"}),
        &admin,
    )
    .await;

    let (status, stats) = get(&app.router, "/api/cases/statistics", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["active"], 1);

    let (_, stats) = get(&app.router, "/api/cases/statistics", &clerk).await;
    assert_eq!(stats["total"], 1);
}
