use axum::extract::{Query, State};
use axum::Extension;
use serde::Deserialize;

use super::{ApiResponse, ApiResult};
use crate::backend::CurrentSession;
use crate::models::DirectorySuggestion;
use crate::AppState;

/// Shorter queries match too much of the directory to be useful.
const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub city: Option<String>,
}

/// GET /api/directory/search
pub async fn search(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<DirectorySuggestion>> {
    let query = params.q.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(ApiResponse::ok(Vec::new()));
    }

    let city = params
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let results = state.backend.search_directory(&session, query, city).await?;
    Ok(ApiResponse::ok(results))
}
