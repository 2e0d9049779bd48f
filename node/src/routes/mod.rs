pub mod health;
pub mod messages;
pub mod records;
pub mod search;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;

/// Large enough for a base64-encoded attachment at the default size limit,
/// so oversized files reach the typed check instead of the body limit.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(search::routes())
        .merge(messages::routes())
        .merge(records::routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
