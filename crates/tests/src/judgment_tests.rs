use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::{
    admin_token, case_body, create_case, create_court, create_judgment, create_user, delete, get,
    judgment_body, post_json, put_json, test_app, TestApp,
};

struct Fixture {
    admin: String,
    judge_id: Uuid,
    judge: String,
    court: Uuid,
    case_id: String,
}

async fn fixture(app: &TestApp) -> Fixture {
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة التجارية").await;
    let (judge_id, judge) =
        create_user(&app.pool, "judge@court.gov.sa", "judge", Some(court)).await;
    let case = create_case(app, &admin, case_body(court, "نزاع توريد")).await;
    Fixture {
        admin,
        judge_id,
        judge,
        court,
        case_id: case["id"].as_str().unwrap().to_string(),
    }
}

fn content_missing(resp: &Value) -> bool {
    resp.get("content").map_or(true, Value::is_null)
}

#[tokio::test]
async fn judge_creates_numbered_draft() {
    let app = test_app().await;
    let f = fixture(&app).await;

    let body = judgment_body(&f.case_id, f.court, "إلزام المدعى عليه بقيمة الإسمنت");
    let resp = create_judgment(&app, &f.judge, body).await;

    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(resp["judgment_number"], format!("{year}/0001"));
    assert_eq!(resp["status"], "draft");
    assert_eq!(resp["is_published"], false);
    assert_eq!(resp["judge"]["id"], f.judge_id.to_string());
    assert!(resp["appeal_deadline"].as_str().unwrap().starts_with("2025-03-31"));
    assert!(resp["statistics"]["word_count"].as_i64().unwrap() > 0);
    assert_eq!(resp["content"]["verdict"], "حكمت المحكمة بإلزام المدعى عليه بالتعويض");

    let second = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "حكم ثان")).await;
    assert_eq!(second["judgment_number"], format!("{year}/0002"));
}

#[tokio::test]
async fn create_rejects_incomplete_or_unknown() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(f.court)).await;

    let mut incomplete = judgment_body(&f.case_id, f.court, "ملخص");
    incomplete["content"]["facts"] = json!("   ");
    let (status, resp) = post_json(&app.router, "/api/judgments", &incomplete, &f.judge).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp["field_errors"]["content.facts"].is_string());

    let mut bad_decision = judgment_body(&f.case_id, f.court, "ملخص");
    bad_decision["decision"] = json!("maybe");
    let (status, _) = post_json(&app.router, "/api/judgments", &bad_decision, &f.judge).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let no_case = judgment_body(&Uuid::new_v4().to_string(), f.court, "ملخص");
    let (status, _) = post_json(&app.router, "/api/judgments", &no_case, &f.judge).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let no_court = judgment_body(&f.case_id, Uuid::new_v4(), "ملخص");
    let (status, _) = post_json(&app.router, "/api/judgments", &no_court, &f.judge).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let ok = judgment_body(&f.case_id, f.court, "ملخص");
    let (status, _) = post_json(&app.router, "/api/judgments", &ok, &clerk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_drops_content_and_follows_scope() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let (_, other_judge) =
        create_user(&app.pool, "judge2@court.gov.sa", "judge", Some(f.court)).await;
    let (_, outsider) = create_user(&app.pool, "outsider@example.com", "user", None).await;

    let first = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "أول")).await;
    create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ثان")).await;
    post_json(
        &app.router,
        &format!("/api/judgments/{}/publish", first["id"].as_str().unwrap()),
        &json!({}),
        &f.judge,
    )
    .await;

    let (status, resp) = get(&app.router, "/api/judgments", &f.judge).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 2);
    assert!(content_missing(&resp["data"][0]));

    let (_, resp) = get(&app.router, "/api/judgments", &other_judge).await;
    assert_eq!(resp["meta"]["total"], 0);

    let (_, resp) = get(&app.router, "/api/judgments", &outsider).await;
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["summary"], "أول");

    let (_, resp) = get(&app.router, "/api/judgments?status=issued", &f.admin).await;
    assert_eq!(resp["meta"]["total"], 1);

    let (status, _) = get(&app.router, "/api/judgments?type=verbal", &f.admin).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_returns_full_content() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let created = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ملخص")).await;

    let (status, resp) = get(
        &app.router,
        &format!("/api/judgments/{}", created["id"].as_str().unwrap()),
        &f.admin,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["content"]["introduction"], "بعد الاطلاع على الأوراق وسماع المرافعة");

    let (status, _) =
        get(&app.router, &format!("/api/judgments/{}", Uuid::new_v4()), &f.admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edits_close_once_issued() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let (_, other_judge) =
        create_user(&app.pool, "judge2@court.gov.sa", "judge", Some(f.court)).await;
    let created = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ملخص")).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/judgments/{id}");

    let (status, _) = put_json(&app.router, &uri, &json!({"summary": "تعديل"}), &other_judge).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = put_json(
        &app.router,
        &uri,
        &json!({"summary": "ملخص معدل", "review_comments": "تصحيح لغوي"}),
        &f.judge,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["summary"], "ملخص معدل");

    let (status, resp) =
        post_json(&app.router, &format!("{uri}/publish"), &json!({}), &f.judge).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "issued");
    assert_eq!(resp["is_published"], true);
    assert_eq!(resp["publication_medium"], json!(["website"]));

    let (status, _) = put_json(&app.router, &uri, &json!({"summary": "بعد النشر"}), &f.judge).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = put_json(&app.router, &uri, &json!({"summary": "بعد النشر"}), &f.admin).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn appeals_are_numbered_after_judgment() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let created = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ملخص")).await;
    let number = created["judgment_number"].as_str().unwrap();
    let uri = format!("/api/judgments/{}/appeals", created["id"].as_str().unwrap());

    let appeal = json!({"appellant": "شركة البناء", "grounds": "خطأ في تطبيق القانون"});
    let (status, resp) = post_json(&app.router, &uri, &appeal, &f.judge).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["status"], "appealed");
    assert_eq!(resp["appeals"][0]["appeal_number"], format!("{number}-A1"));
    assert_eq!(resp["appeals"][0]["status"], "pending");

    let (_, resp) = post_json(&app.router, &uri, &appeal, &f.admin).await;
    assert_eq!(resp["appeals"][1]["appeal_number"], format!("{number}-A2"));

    let (status, _) =
        post_json(&app.router, &uri, &json!({"appellant": "x", "grounds": " "}), &f.judge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_admin_deletes_drafts() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let draft = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "مسودة")).await;
    let issued = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "صادر")).await;
    let draft_uri = format!("/api/judgments/{}", draft["id"].as_str().unwrap());
    let issued_uri = format!("/api/judgments/{}", issued["id"].as_str().unwrap());
    post_json(&app.router, &format!("{issued_uri}/publish"), &json!({}), &f.judge).await;

    let (status, _) = delete(&app.router, &draft_uri, &f.judge).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = delete(&app.router, &issued_uri, &f.admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resp) = delete(&app.router, &draft_uri, &f.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "تم حذف الحكم بنجاح");

    let (status, _) = get(&app.router, &draft_uri, &f.admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn draft_delete_does_not_free_its_number() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let year = chrono::Utc::now().format("%Y").to_string();

    let first = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "أول")).await;
    create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ثان")).await;
    let (status, _) = delete(
        &app.router,
        &format!("/api/judgments/{}", first["id"].as_str().unwrap()),
        &f.admin,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let third = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "ثالث")).await;
    assert_eq!(third["judgment_number"], format!("{year}/0003"));
}

#[tokio::test]
async fn concurrent_judgments_get_distinct_numbers() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let a = judgment_body(&f.case_id, f.court, "متزامن أ");
    let b = judgment_body(&f.case_id, f.court, "متزامن ب");

    let ((status_a, resp_a), (status_b, resp_b)) = tokio::join!(
        post_json(&app.router, "/api/judgments", &a, &f.judge),
        post_json(&app.router, "/api/judgments", &b, &f.judge),
    );
    assert_eq!(status_a, StatusCode::CREATED, "{resp_a}");
    assert_eq!(status_b, StatusCode::CREATED, "{resp_b}");
    assert_ne!(resp_a["judgment_number"], resp_b["judgment_number"]);
}

#[tokio::test]
async fn full_text_search_over_judgments() {
    let app = test_app().await;
    let f = fixture(&app).await;
    create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "تعويض عن تأخير التوريد")).await;
    let mut other = judgment_body(&f.case_id, f.court, "فسخ عقد إيجار");
    other["content"]["facts"] = json!("استأجر المدعي محلا تجاريا");
    create_judgment(&app, &f.judge, other).await;
    assert_eq!(app.search.len(), 2);

    let (status, resp) = get(&app.router, "/api/judgments/search?q=%D8%A5%D9%8A%D8%AC%D8%A7%D8%B1", &f.judge).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["data"][0]["summary"], "فسخ عقد إيجار");
    assert!(content_missing(&resp["data"][0]));

    let (status, _) = get(&app.router, "/api/judgments/search?q=a", &f.judge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn statistics_count_published() {
    let app = test_app().await;
    let f = fixture(&app).await;
    let first = create_judgment(&app, &f.judge, judgment_body(&f.case_id, f.court, "أول")).await;
    let mut reject = judgment_body(&f.case_id, f.court, "ثان");
    reject["decision"] = json!("reject");
    create_judgment(&app, &f.judge, reject).await;
    post_json(
        &app.router,
        &format!("/api/judgments/{}/publish", first["id"].as_str().unwrap()),
        &json!({"medium": ["gazette"]}),
        &f.judge,
    )
    .await;

    let (status, stats) = get(&app.router, "/api/judgments/statistics", &f.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["published"], 1);
    assert_eq!(stats["by_decision"].as_array().unwrap().len(), 2);
}
