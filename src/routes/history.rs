//! History Routes
//!
//! 번역 키별 변경 이력 조회

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::{with_db, AppState};
use crate::error::ApiResult;
use crate::models::HistoryEntry;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<HistoryEntry>,
}

/// GET /api/history/:translation_id (최신순)
pub async fn get_history(
    State(state): State<AppState>,
    Path(translation_id): Path<i64>,
) -> ApiResult<Json<HistoryResponse>> {
    let data = with_db(&state, move |db| db.history(translation_id)).await?;
    Ok(Json(HistoryResponse { data }))
}
