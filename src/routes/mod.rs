//! HTTP Routes
//!
//! REST 엔드포인트 정의와 공용 라우터 상태

pub mod history;
pub mod languages;
pub mod translations;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::{Database, DbState};
use crate::error::{ApiResult, L10nError, L10nResult};
use crate::models::DEFAULT_AUTHOR;

/// 변경자를 지정하는 요청 헤더
pub const CHANGED_BY_HEADER: &str = "x-changed-by";

/// 라우터 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbState>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(db: Database, upload_dir: PathBuf) -> Self {
        Self {
            db: Arc::new(DbState::new(db)),
            upload_dir,
        }
    }
}

/// 블로킹 풀에서 DB 잠금을 잡고 작업 실행
pub(crate) async fn with_db<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&mut Database) -> L10nResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(&state.db);
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = db.0.lock().map_err(|e| L10nError::Lock(e.to_string()))?;
        f(&mut *guard)
    })
    .await
    .map_err(|e| L10nError::Task(e.to_string()))?;

    Ok(result?)
}

/// 요청 헤더에서 변경자 추출 (없으면 기본값)
pub(crate) fn changed_by(headers: &HeaderMap) -> String {
    headers
        .get(CHANGED_BY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_AUTHOR)
        .to_string()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// API 라우터 생성
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .route(
            "/api/translations",
            get(translations::list_translations).post(translations::create_translation),
        )
        .route("/api/translations/export", get(translations::export_translations))
        .route("/api/translations/import", post(translations::import_translations))
        .route("/api/translations/:id", put(translations::update_translation))
        .route("/api/history/:translation_id", get(history::get_history))
        .route("/api/languages", get(languages::list_languages))
        .route("/health", get(health))
        .with_state(state);

    let router = match config.existing_static_dir() {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "serving static UI");
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    };

    router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_by_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(changed_by(&headers), "system");

        headers.insert(CHANGED_BY_HEADER, HeaderValue::from_static("  "));
        assert_eq!(changed_by(&headers), "system");

        headers.insert(CHANGED_BY_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(changed_by(&headers), "alice");
    }
}
