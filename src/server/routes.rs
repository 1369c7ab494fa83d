//! HTTP route handlers for the chat API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::view::{self, ConversationSummary, MessageView};
use crate::chat::{ChatError, ConversationId, DeletionReport, MessageId, Notification};

use super::state::AppState;

type ApiError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/state", get(get_state))
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{id}", get(get_conversation))
        .route("/api/conversations/{id}/delete", post(request_delete))
        .route("/api/messages", post(send_message))
        .route("/api/active", post(select_conversation))
        .route("/api/delete/confirm", post(confirm_delete))
        .route("/api/delete/cancel", post(cancel_delete))
        .route("/api/notifications", get(list_notifications))
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse::<ConversationId>()
        .map_err(|e| (StatusCode::BAD_REQUEST, ChatError::from(e).to_string()))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "superai-chat",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Store-wide state.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    /// Active conversation id.
    pub active_id: Option<ConversationId>,
    /// Whether a simulated reply is pending.
    pub is_typing: bool,
    /// Number of conversations.
    pub conversation_count: usize,
    /// Conversation awaiting deletion confirmation.
    pub pending_delete: Option<ConversationId>,
}

async fn current_state(state: &AppState) -> StateResponse {
    let snapshot = state.chat.snapshot().await;
    StateResponse {
        active_id: snapshot.active_id,
        is_typing: snapshot.is_typing,
        conversation_count: snapshot.conversations.len(),
        pending_delete: state.chat.pending_delete(),
    }
}

/// Return the store-wide state.
async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(current_state(&state).await)
}

/// Sidebar search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive title filter.
    pub search: Option<String>,
}

/// List conversations for the sidebar.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<ConversationSummary>> {
    let term = params.search.unwrap_or_default();
    let conversations = state.chat.filter_conversations(&term).await;
    let active = state.chat.snapshot().await.active_id;
    Json(view::summarize(&conversations, active, Utc::now()))
}

/// A conversation with its message bubbles.
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    /// Conversation id.
    pub id: ConversationId,
    /// Title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity.
    pub updated_at: DateTime<Utc>,
    /// Messages, oldest first.
    pub messages: Vec<MessageView>,
}

/// Return a single conversation.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConversationDetail>, ApiError> {
    let id = parse_id(&id)?;
    let conversation = state
        .chat
        .conversation(id)
        .await
        .ok_or((StatusCode::NOT_FOUND, format!("conversation {id} not found")))?;

    Ok(Json(ConversationDetail {
        id: conversation.id,
        title: conversation.title,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
        messages: view::message_views(&conversation.messages),
    }))
}

/// Send message request.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Composer text.
    pub text: String,
}

/// Send message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    /// Conversation that received the message.
    pub conversation_id: ConversationId,
    /// Recorded user message.
    pub message_id: MessageId,
    /// Whether the conversation was created by this send.
    pub created: bool,
    /// Delay before the simulated reply lands, in milliseconds.
    pub reply_delay_ms: u64,
}

/// Record a user message and schedule the simulated reply.
///
/// Blank text answers `204 No Content` and changes nothing.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendRequest>,
) -> Response {
    let Some(sent) = state.chat.send_message(&request.text).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    Json(SendResponse {
        conversation_id: sent.receipt.conversation_id,
        message_id: sent.receipt.message_id,
        created: sent.receipt.created,
        reply_delay_ms: state.chat.config().reply_delay_ms,
    })
    .into_response()
}

/// Active conversation selection.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Conversation to activate; `null` starts a new chat.
    pub id: Option<String>,
}

/// Set or clear the active conversation.
async fn select_conversation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    let id = request.id.as_deref().map(parse_id).transpose()?;
    if !state.chat.select_conversation(id).await {
        return Err((StatusCode::NOT_FOUND, "conversation not found".to_string()));
    }
    Ok(Json(current_state(&state).await))
}

/// Opened deletion dialog.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRequestResponse {
    /// Conversation awaiting confirmation.
    pub conversation_id: ConversationId,
    /// Title to show in the dialog.
    pub title: String,
}

/// Open the deletion dialog for a conversation.
async fn request_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRequestResponse>, ApiError> {
    let id = parse_id(&id)?;
    let title = state.chat.request_delete(id).await;
    Ok(Json(DeleteRequestResponse {
        conversation_id: id,
        title,
    }))
}

fn no_pending_delete() -> ApiError {
    (StatusCode::CONFLICT, "no deletion awaiting confirmation".to_string())
}

/// Confirm the open deletion request.
async fn confirm_delete(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeletionReport>, ApiError> {
    state
        .chat
        .confirm_delete()
        .await
        .map(Json)
        .ok_or_else(no_pending_delete)
}

/// Cancel the open deletion request.
async fn cancel_delete(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeletionReport>, ApiError> {
    state
        .chat
        .cancel_delete()
        .await
        .map(Json)
        .ok_or_else(no_pending_delete)
}

/// Notifications emitted so far, oldest first.
async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.notifications.entries())
}
