//! Chat routes acting on behalf of the request user.

use crate::error::{ApiError, ApiResult};
use crate::identity::RequestUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dsefs_messaging::{Message, OutgoingFile, OutgoingMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    text: String,
    reply_to_message_id: Option<String>,
    attachment: Option<AttachmentUpload>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentUpload {
    name: String,
    #[serde(rename = "type", default)]
    mime_type: String,
    base64: String,
}

impl AttachmentUpload {
    fn into_file(self) -> ApiResult<OutgoingFile> {
        let bytes = STANDARD
            .decode(self.base64.as_bytes())
            .map_err(|err| ApiError::BadRequest(format!("attachment is not valid base64: {err}")))?;
        Ok(OutgoingFile::new(self.name, self.mime_type, bytes))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    emoji: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    message_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    deleted: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", get(list_messages).post(send_message))
        .route("/messages/unread", get(unread_count))
        .route("/messages/read", post(mark_as_read))
        .route("/messages/:id", delete(delete_message))
        .route("/messages/:id/reactions", post(toggle_reaction))
}

async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    let store = state.messages().read().await;
    Json(store.display_messages().into_iter().cloned().collect())
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    RequestUser(user): RequestUser,
    Json(request): Json<SendRequest>,
) -> ApiResult<Response> {
    let mut draft = OutgoingMessage::text(request.text);
    if let Some(reply_to) = request.reply_to_message_id {
        draft = draft.replying_to(reply_to);
    }
    if let Some(upload) = request.attachment {
        draft = draft.with_file(upload.into_file()?);
    }

    let mut store = state.messages().write().await;
    store.set_current_user(user);
    match store.send(draft)? {
        Some(message) => {
            info!(message_id = %message.id, sender_id = %message.sender_id, "chat message sent");
            Ok((StatusCode::CREATED, Json(message)).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn delete_message(
    State(state): State<Arc<AppState>>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let mut store = state.messages().write().await;
    store.set_current_user(user);
    let deleted = store.delete(&id)?;
    Ok(Json(DeleteResponse { deleted }))
}

async fn toggle_reaction(
    State(state): State<Arc<AppState>>,
    RequestUser(user): RequestUser,
    Path(id): Path<String>,
    Json(request): Json<ReactionRequest>,
) -> ApiResult<Response> {
    let mut store = state.messages().write().await;
    store.set_current_user(user);
    if !store.toggle_reaction(&id, &request.emoji)? {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    match store.get(&id) {
        Some(message) => Ok(Json(message.clone()).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn unread_count(
    State(state): State<Arc<AppState>>,
    RequestUser(user): RequestUser,
) -> Json<UnreadResponse> {
    let mut store = state.messages().write().await;
    store.set_current_user(user);
    Json(UnreadResponse {
        count: store.unread_count(),
    })
}

async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    RequestUser(user): RequestUser,
    Json(request): Json<MarkReadRequest>,
) -> ApiResult<Json<UnreadResponse>> {
    let mut store = state.messages().write().await;
    store.set_current_user(user);
    let count = store.mark_as_read(request.message_ids.as_deref())?;
    Ok(Json(UnreadResponse { count }))
}
