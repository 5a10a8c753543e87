use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::{with_db, AppState};
use crate::error::ApiResult;
use crate::models::Language;

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub data: Vec<Language>,
}

/// GET /api/languages
pub async fn list_languages(State(state): State<AppState>) -> ApiResult<Json<LanguagesResponse>> {
    let data = with_db(&state, |db| db.languages()).await?;
    Ok(Json(LanguagesResponse { data }))
}
