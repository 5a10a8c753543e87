//! Translation Routes
//!
//! 목록/검색, 생성, 수정, 내보내기, 일괄 임포트

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use super::{changed_by, with_db, AppState};
use crate::error::{ApiError, ApiResult, L10nError};
use crate::models::{
    parse_import, text_fields, ExportDump, ImportSummary, TextFields, TranslationRow,
    TranslationTable,
};
use crate::utils::TempUpload;

/// 임포트 파일을 담는 multipart 필드 이름
const IMPORT_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub summary: ImportSummary,
}

fn body_object(body: &Value) -> ApiResult<&serde_json::Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))
}

/// GET /api/translations?search=S
pub async fn list_translations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TranslationTable>> {
    let table = with_db(&state, move |db| db.list_translations(query.search.as_deref())).await?;
    Ok(Json(table))
}

/// POST /api/translations
pub async fn create_translation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let object = body_object(&body)?;
    let key = match object.get("key") {
        Some(Value::String(key)) if !key.is_empty() => key.clone(),
        _ => return Err(ApiError::bad_request("Key is required")),
    };
    let texts = text_fields(object);
    let author = changed_by(&headers);

    let row = with_db(&state, move |db| db.create_translation(&key, &texts, &author)).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/translations/:id
pub async fn update_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<TranslationRow>> {
    let texts: TextFields = text_fields(body_object(&body)?);
    let author = changed_by(&headers);

    let row = with_db(&state, move |db| db.update_translation(id, &texts, &author)).await?;
    Ok(Json(row))
}

/// GET /api/translations/export
pub async fn export_translations(State(state): State<AppState>) -> ApiResult<Json<ExportDump>> {
    let dump = with_db(&state, |db| db.export_translations()).await?;
    Ok(Json(dump))
}

/// 업로드 필드를 임시 파일로 저장
async fn save_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> ApiResult<Option<TempUpload>> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart field: {}", e)))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }

        let (upload, mut file) = TempUpload::create(&state.upload_dir).await?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
        {
            file.write_all(&chunk).await.map_err(L10nError::from)?;
        }
        file.flush().await.map_err(L10nError::from)?;

        return Ok(Some(upload));
    }
    Ok(None)
}

/// POST /api/translations/import (multipart `file`)
///
/// 파일 전체가 하나의 트랜잭션으로 반영되며, 임시 파일은 결과와 관계없이 삭제됩니다.
pub async fn import_translations(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportResponse>> {
    let upload = save_upload(&state, &mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded."))?;

    let bytes = tokio::fs::read(upload.path()).await.map_err(L10nError::from)?;
    let content = String::from_utf8(bytes)
        .map_err(|_| ApiError::bad_request("Uploaded file is not valid UTF-8"))?;
    let batch = parse_import(&content)?;

    let summary = with_db(&state, move |db| db.import_translations(&batch)).await?;
    Ok(Json(ImportResponse {
        message: "Bulk import successful.".to_string(),
        summary,
    }))
}
