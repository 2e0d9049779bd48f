//! Global search, history and selection.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dsefs_search::{SearchTarget, SearchableItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// Either a picked result or a literal term.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SelectRequest {
    Item { item: SearchableItem },
    Term { term: String },
}

impl From<SelectRequest> for SearchTarget {
    fn from(request: SelectRequest) -> Self {
        match request {
            SelectRequest::Item { item } => SearchTarget::Item(item),
            SelectRequest::Term { term } => SearchTarget::Term(term),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    path: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/search/history", get(history).delete(clear_history))
        .route("/search/select", post(select))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchableItem>> {
    Json(state.search().search(&params.q))
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<SearchableItem>> {
    Json(state.history().read().await.suggestions())
}

async fn clear_history(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.history().write().await.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Json<SelectResponse>> {
    let (term, path) = SearchTarget::from(request).resolve();
    debug!(%term, %path, "search selection");
    state.history().write().await.add(&term)?;
    Ok(Json(SelectResponse { path }))
}
