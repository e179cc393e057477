use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use server::db::AppState;
use server::rate_limit::RateLimitState;
use server::repo;
use server::repo::user::NewUser;
use server::search::SearchIndex;
use server::storage::LocalDiskStore;
use shared_types::CreateCourtRequest;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

/// Global mutex ensuring tests run sequentially against the shared database.
/// Each test acquires this lock before truncating, so concurrent tests never
/// see each other's rows.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

pub const TEST_PASSWORD: &str = "Secret123!";

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Postgres>,
    pub search: Arc<SearchIndex>,
    _guard: tokio::sync::MutexGuard<'static, ()>,
}

async fn test_pool() -> Pool<Postgres> {
    let _ = dotenvy::dotenv();
    if std::env::var("JWT_SECRET").map(|s| s.is_empty()).unwrap_or(true) {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE documents, judgments, case_events, cases, number_sequences, revoked_tokens, users, \
         courts CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate");

    pool
}

/// Build the full API router over a clean database and a fresh upload dir.
/// Hold the returned `TestApp` for the whole test; it owns the lock.
pub async fn test_app() -> TestApp {
    test_app_with_limiter(None).await
}

/// Like `test_app`, with `limiter` in front of the API instead of none.
pub async fn test_app_with_limiter(limiter: Option<RateLimitState>) -> TestApp {
    let guard = TEST_MUTEX.lock().await;
    let pool = test_pool().await;

    let search = Arc::new(SearchIndex::new().expect("search index"));
    let upload_dir = std::env::temp_dir().join(format!("court-uploads-{}", Uuid::new_v4()));
    let storage = Arc::new(LocalDiskStore::new(upload_dir));
    storage.ensure_root().await.expect("upload dir");

    let state = AppState {
        pool: pool.clone(),
        search: search.clone(),
        storage,
    };
    let router = server::openapi::api_router_with_limiter(state, limiter);

    TestApp {
        router,
        pool,
        search,
        _guard: guard,
    }
}

// ── Seeding ─────────────────────────────────────────────────────────

/// Insert a court directly and return its id.
pub async fn create_court(pool: &Pool<Postgres>, name: &str) -> Uuid {
    let req: CreateCourtRequest = serde_json::from_value(json!({
        "name": name,
        "court_type": "general_court",
        "level": 3,
        "jurisdiction": "civil",
        "city": "الرياض",
        "region": "الرياض",
    }))
    .expect("court request");
    repo::court::create(pool, req).await.expect("create court").id
}

/// Insert an active user and return `(id, bearer token)`.
pub async fn create_user(
    pool: &Pool<Postgres>,
    email: &str,
    role: &str,
    court_id: Option<Uuid>,
) -> (Uuid, String) {
    let hash = server::auth::password::hash_password(TEST_PASSWORD).expect("hash");
    let user = repo::user::create(
        pool,
        NewUser {
            name: "مستخدم اختبار",
            email,
            password_hash: &hash,
            role,
            court_id,
        },
    )
    .await
    .expect("create user");
    let (token, _) =
        server::auth::jwt::create_token(user.id, &user.email, &user.role).expect("token");
    (user.id, token)
}

pub async fn admin_token(pool: &Pool<Postgres>) -> String {
    create_user(pool, "admin@court.gov.sa", "admin", None).await.1
}

pub fn case_body(court_id: Uuid, title: &str) -> Value {
    json!({
        "title": title,
        "description": "نزاع حول عقد توريد مواد بناء",
        "case_type": "commercial",
        "category": "عقود",
        "court_id": court_id,
    })
}

/// Create a case through the API and return the response body.
pub async fn create_case(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, resp) = post_json(&app.router, "/api/cases", &body, token).await;
    assert_eq!(status, StatusCode::CREATED, "create case failed: {resp}");
    resp
}

pub fn judgment_body(case_id: &str, court_id: Uuid, summary: &str) -> Value {
    json!({
        "case_id": case_id,
        "court_id": court_id,
        "judgment_type": "final",
        "decision": "accept",
        "summary": summary,
        "issued_date": "2025-03-01T09:00:00Z",
        "content": {
            "introduction": "بعد الاطلاع على الأوراق وسماع المرافعة",
            "facts": "تتلخص وقائع الدعوى في إخلال المدعى عليه بعقد التوريد",
            "legal_analysis": "نصت المادة على وجوب الوفاء بالعقود",
            "reasoning": "ثبت للمحكمة الإخلال بالالتزام التعاقدي",
            "verdict": "حكمت المحكمة بإلزام المدعى عليه بالتعويض"
        }
    })
}

pub async fn create_judgment(app: &TestApp, token: &str, body: Value) -> Value {
    let (status, resp) = post_json(&app.router, "/api/judgments", &body, token).await;
    assert_eq!(status, StatusCode::CREATED, "create judgment failed: {resp}");
    resp
}

// ── Requests ────────────────────────────────────────────────────────

fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let req = request("GET", uri, Some(token)).body(Body::empty()).unwrap();
    send(app, req).await
}

pub async fn get_anonymous(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = request("GET", uri, None).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = request(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value, token: &str) -> (StatusCode, Value) {
    json_request(app, "POST", uri, body, Some(token)).await
}

pub async fn post_anonymous(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    json_request(app, "POST", uri, body, None).await
}

pub async fn put_json(app: &Router, uri: &str, body: &Value, token: &str) -> (StatusCode, Value) {
    json_request(app, "PUT", uri, body, Some(token)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let req = request("DELETE", uri, Some(token)).body(Body::empty()).unwrap();
    send(app, req).await
}

/// One part of a multipart upload: `(name, filename + content type, bytes)`.
pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            file: Some((filename, content_type)),
            data,
        }
    }
}

pub async fn post_multipart(
    app: &Router,
    uri: &str,
    parts: &[Part<'_>],
    token: &str,
) -> (StatusCode, Value) {
    let boundary = "----court-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match part.file {
            Some((filename, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let req = request("POST", uri, Some(token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

/// Send a request through the router and parse the response.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, req).await;
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or(Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, body)
}

/// Send a request and return status, headers and raw bytes.
pub async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, headers, bytes.to_vec())
}

pub async fn get_raw(app: &Router, uri: &str, token: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let req = request("GET", uri, Some(token)).body(Body::empty()).unwrap();
    send_raw(app, req).await
}
