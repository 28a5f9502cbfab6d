use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use kaiwa_api::state::AppState;
use kaiwa_api::{conversations, messages, middleware, participants};
use kaiwa_gateway::connection;

pub mod session;

/// Assemble the full HTTP surface over a prepared state. Separate from main
/// so integration tests can drive the router without binding a socket.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations", post(conversations::resolve_conversation))
        .route(
            "/threads/{participant_id}/messages",
            get(messages::thread_messages),
        )
        .route(
            "/threads/{participant_id}/messages",
            post(messages::send_message),
        )
        .route("/threads/{participant_id}/read", post(messages::mark_thread_read))
        .route("/participants", get(participants::search_participants))
        .route("/profile", put(participants::update_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state.clone());

    // The feed socket authenticates in-band with an Identify command, so the
    // upgrade itself stays outside the auth layer.
    let feed = Router::new()
        .route("/feed", get(feed_upgrade))
        .with_state(state);

    Router::new()
        .merge(protected)
        .merge(feed)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn feed_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher.clone(), state.jwt_secret.clone())
    })
}
