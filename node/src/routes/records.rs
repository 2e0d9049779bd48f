//! Read and replace the collections the search scans.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use dsefs_search::{Agent, RapportEnPreparation, RecordCollection, SourceRecord, UploadedDocument};
use std::sync::Arc;
use tracing::info;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/records/reports",
            get(list_records::<RapportEnPreparation>).put(replace_records::<RapportEnPreparation>),
        )
        .route(
            "/records/documents",
            get(list_records::<UploadedDocument>).put(replace_records::<UploadedDocument>),
        )
        .route(
            "/records/agents",
            get(list_records::<Agent>).put(replace_records::<Agent>),
        )
}

async fn list_records<R: SourceRecord>(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<R>>> {
    let collection = RecordCollection::<R>::new(Arc::clone(state.storage()));
    Ok(Json(collection.list()?))
}

async fn replace_records<R: SourceRecord>(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<R>>,
) -> ApiResult<StatusCode> {
    let collection = RecordCollection::<R>::new(Arc::clone(state.storage()));
    collection.replace_all(&records)?;
    info!(key = R::STORAGE_KEY, count = records.len(), "collection replaced");
    Ok(StatusCode::NO_CONTENT)
}
