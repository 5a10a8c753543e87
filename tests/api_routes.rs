//! REST API 통합 테스트 (메모리 DB + 라우터 직접 호출)

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use l10n_lib::config::AppConfig;
use l10n_lib::db::Database;
use l10n_lib::models::LanguageSeed;
use l10n_lib::routes::{create_router, AppState, CHANGED_BY_HEADER};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "l10n-test-boundary";

struct TestApp {
    router: Router,
    upload_dir: PathBuf,
    _dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = tempdir().unwrap();
    let upload_dir = dir.path().join("uploads");

    let db = Database::open_in_memory().unwrap();
    db.initialize(&LanguageSeed::defaults()).unwrap();

    let router = create_router(AppState::new(db, upload_dir.clone()), &AppConfig::default());
    TestApp {
        router,
        upload_dir,
        _dir: dir,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value, author: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(author) = author {
        builder = builder.header(CHANGED_BY_HEADER, author);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn multipart_request(field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"import.json\"\r\n\
         Content-Type: application/json\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = field,
        c = content
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/translations/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn upload_dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map(|d| d.count() == 0).unwrap_or(true)
}

#[tokio::test]
async fn test_create_translation() {
    let app = test_app();

    let (status, row) = send(
        &app,
        json_request(
            Method::POST,
            "/api/translations",
            json!({"key": "greeting", "en-US": "Hello", "ko": "안녕"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row["key"], "greeting");
    assert_eq!(row["en-US"], "Hello");
    assert_eq!(row["ko"], "안녕");
    assert_eq!(row["en-GB"], "");

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/translations", json!({"en-US": "Hello"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Key is required");

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/api/translations", json!({"key": "greeting"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_and_history() {
    let app = test_app();

    let (_, row) = send(
        &app,
        json_request(
            Method::POST,
            "/api/translations",
            json!({"key": "title", "en-US": "Title"}),
            None,
        ),
    )
    .await;
    let id = row["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/translations/{}", id),
            json!({"en-US": "Heading", "unknown": "ignored"}),
            Some("alice"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["en-US"], "Heading");
    assert!(updated.get("unknown").is_none());

    let (status, history) = send(&app, get(&format!("/api/history/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = history["data"].as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["changed_by"], "alice");
    assert_eq!(entries[0]["language"], "미국식 영어");
    assert_eq!(entries[0]["old_text"], "Title");
    assert_eq!(entries[0]["new_text"], "Heading");
    assert!(entries[3]["old_text"].is_null());
    assert_eq!(entries[3]["changed_by"], "system");

    // 목록 화면은 피벗 행 전체(id, key 포함)를 그대로 보냅니다.
    let (status, updated) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/translations/{}", id),
            json!({"id": id, "key": "title", "ko": "", "en-US": "Header", "en-GB": ""}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["en-US"], "Header");
    assert_eq!(updated["key"], "title");

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/translations/{}", id),
            json!({"en-US": 42}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        json_request(Method::PUT, "/api/translations/999", json!({"ko": "x"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/history/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_search() {
    let app = test_app();
    for key in ["menu.Foo", "footer", "header"] {
        send(
            &app,
            json_request(Method::POST, "/api/translations", json!({"key": key}), None),
        )
        .await;
    }

    let (status, body) = send(&app, get("/api/translations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["languages"], json!(["ko", "en-US", "en-GB"]));
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, get("/api/translations?search=FOO")).await;
    let keys: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["footer", "menu.Foo"]);

    let (_, body) = send(&app, get("/api/translations?search=")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_import_then_export() {
    let app = test_app();

    let (status, body) = send(
        &app,
        multipart_request(
            "file",
            r#"[{"key":"greeting","id":3,"en-US":"Hello","ko":"안녕","xx":"skip"},{"ko":"no key"}]"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bulk import successful.");
    assert_eq!(body["summary"]["texts_written"], 2);
    assert_eq!(body["summary"]["skipped_fields"], 2);
    assert_eq!(body["summary"]["skipped_items"], 1);
    assert!(upload_dir_is_empty(&app.upload_dir));

    let (status, dump) = send(&app, get("/api/translations/export")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        dump,
        json!({"en-US": {"greeting": "Hello"}, "ko": {"greeting": "안녕"}})
    );

    let (_, list) = send(&app, get("/api/translations")).await;
    let id = list["data"][0]["id"].as_i64().unwrap();
    let (_, history) = send(&app, get(&format!("/api/history/{}", id))).await;
    let entries = history["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["changed_by"] == "bulk_import"));
}

#[tokio::test]
async fn test_import_rejects_bad_payloads() {
    let app = test_app();

    let (status, body) = send(&app, multipart_request("file", r#"{"key":"greeting"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Expected an array"));
    assert!(upload_dir_is_empty(&app.upload_dir));

    let (status, _) = send(&app, multipart_request("file", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(upload_dir_is_empty(&app.upload_dir));

    let (status, body) = send(&app, multipart_request("document", "[]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded.");

    let (_, dump) = send(&app, get("/api/translations/export")).await;
    assert_eq!(dump, json!({}));
}

#[tokio::test]
async fn test_languages_and_health() {
    let app = test_app();

    let (status, body) = send(&app, get("/api/languages")).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["ko", "en-US", "en-GB"]);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
