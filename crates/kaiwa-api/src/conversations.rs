use axum::{Extension, Json, extract::State, response::IntoResponse};

use kaiwa_types::api::{
    Claims, ConversationResponse, ConversationSummaryResponse, ResolveConversationRequest,
};

use crate::error::{ApiError, join_error};
use crate::state::AppState;

/// All conversations touching the caller, newest activity first. Each entry
/// carries the other participant's profile and the caller's unread count.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let principal = claims.sub;

    // Run blocking DB work off the async runtime
    let summaries = tokio::task::spawn_blocking(
        move || -> Result<Vec<ConversationSummaryResponse>, ApiError> {
            let rows = db.db.list_conversations(principal)?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(row.into_summary()?.into());
            }
            Ok(out)
        },
    )
    .await
    .map_err(join_error)??;

    Ok(Json(summaries))
}

/// Find-or-create the conversation between the caller and another participant.
/// Safe to call from both sides at once: the pair is stored canonically, so
/// everyone lands on the same row.
pub async fn resolve_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ResolveConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.participant_id == claims.sub {
        return Err(ApiError::Validation(
            "cannot open a conversation with yourself".into(),
        ));
    }

    let db = state.clone();
    let principal = claims.sub;
    let username = claims.username.clone();
    let target = req.participant_id;

    let conversation =
        tokio::task::spawn_blocking(move || -> Result<ConversationResponse, ApiError> {
            db.db.ensure_profile(principal, &username)?;
            if db.db.get_profile(target)?.is_none() {
                return Err(ApiError::NotFound("participant"));
            }
            let row = db.db.resolve_conversation(principal, target)?;
            Ok(row.into_conversation()?.into())
        })
        .await
        .map_err(join_error)??;

    Ok(Json(conversation))
}
