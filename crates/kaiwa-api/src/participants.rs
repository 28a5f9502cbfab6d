use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use kaiwa_types::api::{Claims, ParticipantResponse, UpdateProfileRequest};

use crate::error::{ApiError, join_error};
use crate::state::AppState;

/// Hard cap on finder results; the UI only ever shows a short list.
const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Case-insensitive participant search over username and display name.
/// An empty query is answered locally with an empty list.
pub async fn search_participants(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let needle = query.q.trim().to_string();
    if needle.is_empty() {
        return Ok(Json(Vec::<ParticipantResponse>::new()));
    }

    let db = state.clone();
    let principal = claims.sub;

    let participants =
        tokio::task::spawn_blocking(move || -> Result<Vec<ParticipantResponse>, ApiError> {
            let rows = db.db.search_profiles(principal, &needle, SEARCH_LIMIT)?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(row.into_participant()?.into());
            }
            Ok(out)
        })
        .await
        .map_err(join_error)??;

    Ok(Json(participants))
}

/// Create or update the caller's profile. Username always follows the token;
/// only the display fields are editable, and blank strings clear them.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let principal = claims.sub;
    let username = claims.username.clone();

    let profile = tokio::task::spawn_blocking(move || -> Result<ParticipantResponse, ApiError> {
        let display_name = req
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let avatar_url = req
            .avatar_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let row = db
            .db
            .upsert_profile(principal, &username, display_name, avatar_url)?;
        Ok(row.into_participant()?.into())
    })
    .await
    .map_err(join_error)??;

    Ok(Json(profile))
}
