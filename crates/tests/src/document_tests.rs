use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::{
    admin_token, case_body, create_case, create_court, create_user, delete, get, get_raw,
    post_json, post_multipart, test_app, Part, TestApp,
};

const NOTE: &[u8] = b"contract breach contract delivery penalty";
const PDF: &[u8] = b"%PDF-1.4 fake pdf body";

async fn upload_note(app: &TestApp, token: &str, case_id: Option<&str>) -> Value {
    let mut parts = vec![
        Part::file("note.txt", "text/plain", NOTE),
        Part::text("title", "مذكرة دفاع"),
        Part::text("type", "response"),
        Part::text("category", "مذكرات"),
        Part::text("tags", "دفاع, عقود ,"),
    ];
    if let Some(case_id) = case_id {
        parts.push(Part::text("case_id", case_id));
    }
    let (status, resp) = post_multipart(&app.router, "/api/documents", &parts, token).await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {resp}");
    resp
}

#[tokio::test]
async fn text_upload_is_processed() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (clerk_id, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let case = create_case(&app, &clerk, case_body(court, "قضية")).await;

    let doc = upload_note(&app, &clerk, case["id"].as_str()).await;
    assert_eq!(doc["title"], "مذكرة دفاع");
    assert_eq!(doc["document_type"], "response");
    assert_eq!(doc["confidentiality_level"], "internal");
    assert_eq!(doc["processing_status"], "processed");
    assert_eq!(doc["status"], "active");
    assert_eq!(doc["can_download"], true);
    assert_eq!(doc["tags"], serde_json::json!(["دفاع", "عقود"]));
    assert_eq!(doc["case"]["id"], case["id"]);
    assert_eq!(doc["court_id"], court.to_string());
    assert_eq!(doc["uploaded_by"]["id"], clerk_id.to_string());
    assert_eq!(doc["file"]["original_name"], "note.txt");
    assert_eq!(doc["file"]["mime_type"], "text/plain");
    assert_eq!(doc["file"]["size"], NOTE.len());
    assert_eq!(doc["content"]["language"], "en");
    assert_eq!(
        doc["content"]["keywords"],
        serde_json::json!(["contract", "breach", "delivery", "penalty"])
    );
    assert_eq!(doc["versions"].as_array().unwrap().len(), 1);
    assert_eq!(doc["versions"][0]["is_active"], true);
}

#[tokio::test]
async fn binary_upload_waits_for_processing() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;

    let parts = [
        Part::file("claim.pdf", "application/pdf", PDF),
        Part::text("title", "صحيفة الدعوى"),
        Part::text("document_type", "petition"),
        Part::text("category", "صحف"),
        Part::text("confidentiality_level", "public"),
    ];
    let (status, doc) = post_multipart(&app.router, "/api/documents", &parts, &admin).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["processing_status"], "uploaded");
    assert_eq!(doc["file"]["extension"], "pdf");
    assert!(doc["file"]["filename"].as_str().unwrap().ends_with(".pdf"));
    assert!(doc["content"]["keywords"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_rejects_bad_input() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let upload = |parts: Vec<Part<'static>>| {
        let router = app.router.clone();
        let token = admin.clone();
        async move { post_multipart(&router, "/api/documents", &parts, &token).await }
    };

    let (status, _) = upload(vec![
        Part::text("title", "بدون ملف"),
        Part::text("type", "other"),
        Part::text("category", "عام"),
    ])
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resp) = upload(vec![
        Part::file("archive.zip", "application/zip", b"PK"),
        Part::text("title", "أرشيف"),
        Part::text("type", "other"),
        Part::text("category", "عام"),
    ])
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "نوع الملف غير مدعوم");

    let (status, _) = upload(vec![
        Part::file("empty.txt", "text/plain", b""),
        Part::text("title", "فارغ"),
        Part::text("type", "other"),
        Part::text("category", "عام"),
    ])
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(vec![Part::file("a.txt", "text/plain", b"abc")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(vec![
        Part::file("a.txt", "text/plain", b"abc"),
        Part::text("title", "نوع خاطئ"),
        Part::text("type", "meme"),
        Part::text("category", "عام"),
    ])
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing_case = uuid::Uuid::new_v4().to_string();
    let (status, _) = post_multipart(
        &app.router,
        "/api/documents",
        &[
            Part::file("a.txt", "text/plain", b"abc"),
            Part::text("title", "قضية مفقودة"),
            Part::text("type", "other"),
            Part::text("category", "عام"),
            Part::text("case_id", &missing_case),
        ],
        &admin,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn access_follows_uploader_and_case() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let (_, colleague) = create_user(&app.pool, "colleague@court.gov.sa", "user", Some(court)).await;
    let (_, outsider) = create_user(&app.pool, "outsider@example.com", "user", None).await;
    let case = create_case(&app, &clerk, case_body(court, "قضية")).await;

    let doc = upload_note(&app, &clerk, case["id"].as_str()).await;
    let uri = format!("/api/documents/{}", doc["id"].as_str().unwrap());

    let (status, resp) = get(&app.router, &uri, &colleague).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["view_count"], 1);
    assert!(resp["content"]["text"].is_string());

    let (status, _) = get(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = get(&app.router, "/api/documents", &colleague).await;
    assert_eq!(list["meta"]["total"], 1);
    assert!(list["data"][0]["content"].get("text").is_none());

    let (_, list) = get(&app.router, "/api/documents", &outsider).await;
    assert_eq!(list["meta"]["total"], 0);

    let (status, _) = get(&app.router, "/api/documents?type=meme", &clerk).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn download_streams_file() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let doc = upload_note(&app, &admin, None).await;
    let id = doc["id"].as_str().unwrap();
    let uri = format!("/api/documents/{id}/download");

    let (status, headers, bytes) = get_raw(&app.router, &uri, &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, NOTE);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"{}\"", doc["file"]["filename"].as_str().unwrap())
    );

    sqlx::query("UPDATE documents SET status = 'archived' WHERE id = $1::UUID")
        .bind(id)
        .execute(&app.pool)
        .await
        .unwrap();
    let (status, _, _) = get_raw(&app.router, &uri, &admin).await;
    assert_eq!(status, StatusCode::GONE);
}

#[tokio::test]
async fn new_version_replaces_active_file() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let (_, other) = create_user(&app.pool, "other@court.gov.sa", "clerk", Some(court)).await;
    let doc = upload_note(&app, &clerk, None).await;
    let uri = format!("/api/documents/{}/versions", doc["id"].as_str().unwrap());

    let parts = [
        Part::file("note-v2.pdf", "application/pdf", PDF),
        Part::text("changes", "تصحيح الصفحة الأولى"),
    ];
    let (status, _) = post_multipart(&app.router, &uri, &parts, &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = post_multipart(&app.router, &uri, &parts, &clerk).await;
    assert_eq!(status, StatusCode::CREATED);
    let versions = resp["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["is_active"], false);
    assert_eq!(versions[1]["version"], 2);
    assert_eq!(versions[1]["is_active"], true);
    assert_eq!(versions[1]["changes"], "تصحيح الصفحة الأولى");
    assert_eq!(resp["file"]["original_name"], "note-v2.pdf");
    assert_eq!(resp["processing_status"], "uploaded");

    let (status, _) = post_multipart(&app.router, &uri, &[Part::text("changes", "x")], &clerk).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_soft_and_restricted() {
    let app = test_app().await;
    let admin = admin_token(&app.pool).await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let (_, other) = create_user(&app.pool, "other@court.gov.sa", "clerk", Some(court)).await;
    let doc = upload_note(&app, &clerk, None).await;
    let id = doc["id"].as_str().unwrap();
    let uri = format!("/api/documents/{id}");

    let (status, _) = delete(&app.router, &uri, &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = delete(&app.router, &uri, &clerk).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "تم حذف المستند بنجاح");

    let (status, _) = get(&app.router, &uri, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let row_status: String = sqlx::query_scalar("SELECT status FROM documents WHERE id = $1::UUID")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row_status, "deleted");
}

#[tokio::test]
async fn explicit_grants_open_access_by_level() {
    let app = test_app().await;
    let court = create_court(&app.pool, "المحكمة العامة").await;
    let (_, clerk) = create_user(&app.pool, "clerk@court.gov.sa", "clerk", Some(court)).await;
    let (outsider_id, outsider) =
        create_user(&app.pool, "outsider@example.com", "user", None).await;
    let doc = upload_note(&app, &clerk, None).await;
    let uri = format!("/api/documents/{}", doc["id"].as_str().unwrap());
    let grants = format!("{uri}/permissions");
    let grant = |access: &str| serde_json::json!({"user_id": outsider_id, "access": access});

    let (status, _) = get(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = post_json(&app.router, &grants, &grant("view"), &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = post_json(&app.router, &grants, &grant("own"), &clerk).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let stranger = serde_json::json!({"user_id": uuid::Uuid::new_v4(), "access": "view"});
    let (status, _) = post_json(&app.router, &grants, &stranger, &clerk).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, resp) = post_json(&app.router, &grants, &grant("view"), &clerk).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["permissions"], serde_json::json!([{"user_id": outsider_id, "access": "view"}]));
    let (status, _) = get(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = get(&app.router, "/api/documents", &outsider).await;
    assert_eq!(list["meta"]["total"], 1);

    let version = [Part::file("v2.txt", "text/plain", b"updated")];
    let (status, _) = post_multipart(&app.router, &format!("{uri}/versions"), &version, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A new grant replaces the old one rather than stacking.
    let (_, resp) = post_json(&app.router, &grants, &grant("edit"), &clerk).await;
    assert_eq!(resp["permissions"].as_array().unwrap().len(), 1);
    let (status, _) = post_multipart(&app.router, &format!("{uri}/versions"), &version, &outsider).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = delete(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) =
        delete(&app.router, &format!("{grants}/{outsider_id}"), &clerk).await;
    assert_eq!(status, StatusCode::OK);
    assert!(resp["permissions"].as_array().unwrap().is_empty());
    let (status, _) = get(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    post_json(&app.router, &grants, &grant("delete"), &clerk).await;
    let (status, _) = delete(&app.router, &uri, &outsider).await;
    assert_eq!(status, StatusCode::OK);
}
