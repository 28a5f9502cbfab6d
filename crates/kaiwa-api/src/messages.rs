use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;
use uuid::Uuid;

use kaiwa_types::api::{Claims, MarkReadResponse, MessageResponse, SendMessageRequest};
use kaiwa_types::events::FeedEvent;
use kaiwa_types::models::Message;

use crate::error::{ApiError, join_error};
use crate::state::AppState;

/// Full history of the thread with the given participant, oldest first.
/// A pair that never talked gets an empty list, not a 404.
pub async fn thread_messages(
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let principal = claims.sub;

    let messages = tokio::task::spawn_blocking(move || -> Result<Vec<MessageResponse>, ApiError> {
        let rows = db.db.thread_between(principal, other)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.into_message()?.into());
        }
        Ok(out)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(messages))
}

/// Store a message to the given participant and fan it out to live feeds.
/// Whitespace-only content is a deliberate no-op: 204, nothing stored.
pub async fn send_message(
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    if other == claims.sub {
        return Err(ApiError::Validation("cannot message yourself".into()));
    }

    let db = state.clone();
    let principal = claims.sub;
    let username = claims.username.clone();

    let message = tokio::task::spawn_blocking(move || -> Result<Message, ApiError> {
        db.db.ensure_profile(principal, &username)?;
        if db.db.get_profile(other)?.is_none() {
            return Err(ApiError::NotFound("participant"));
        }
        let (_conversation, row) = db.db.append_message(principal, other, &content)?;
        Ok(row.into_message()?)
    })
    .await
    .map_err(join_error)??;

    // Fan out to whoever is watching this sender's feed right now.
    let delivered = state.dispatcher.publish(FeedEvent::message_created(&message));
    debug!(
        "message {} delivered to {} live subscribers",
        message.id, delivered
    );

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))).into_response())
}

/// Stamp every unread incoming message in the thread as read.
pub async fn mark_thread_read(
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let principal = claims.sub;

    let marked = tokio::task::spawn_blocking(move || -> Result<u64, ApiError> {
        Ok(db.db.mark_thread_read(principal, other)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(MarkReadResponse { marked }))
}
