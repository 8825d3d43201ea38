//! Session and chat routes.
//!
//! Wire contract (camelCase JSON, matching the web client):
//! - `POST /api/session/start` - create a session, return 3 opening lines
//! - `POST /api/session/message` - post a user message, get the reply
//! - `GET /api/session/{session_id}` - stats snapshot
//!
//! Completion-service failures never produce an error response; the client
//! always receives a chat-shaped reply. Only unknown session ids yield 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ember_core::{Error, Profile, SessionStats};

use crate::state::AppState;

/// Create session router
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/message", post(post_message))
        .route("/session/{session_id}", get(get_session_stats))
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a core error onto the HTTP surface. Domain absence is 404;
/// everything else that escapes this far is a 500.
fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match status {
        StatusCode::NOT_FOUND => "Session not found".to_string(),
        _ => err.to_string(),
    };
    (status, Json(ErrorResponse { error: message }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub profile_id: String,
    pub name: String,
    pub age: u32,
    pub personality: String,
    #[serde(default)]
    pub user_city: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
    pub messages: Vec<String>,
}

/// Start a new conversation session
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, (StatusCode, Json<ErrorResponse>)> {
    let profile = Profile {
        name: req.name,
        age: req.age,
        personality: req.personality,
    };

    let started = state
        .chat
        .start_session(&req.profile_id, profile, req.user_city.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Json(StartSessionResponse {
        session_id: started.session_id,
        messages: started.messages,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageResponse {
    pub message: String,
    pub session_id: String,
    pub user_message_count: u32,
    pub premium_suggested: bool,
    pub should_show_premium_button: bool,
}

/// Post a user message and return the assistant reply with session stats
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<PostMessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let reply = state
        .chat
        .post_message(&req.session_id, &req.message)
        .await
        .map_err(error_response)?;

    Ok(Json(PostMessageResponse {
        message: reply.message,
        session_id: reply.stats.session_id,
        user_message_count: reply.stats.user_message_count,
        premium_suggested: reply.stats.premium_suggested,
        should_show_premium_button: reply.stats.should_show_premium_button,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub session_id: String,
    pub user_message_count: u32,
    pub premium_suggested: bool,
    pub should_show_premium_button: bool,
}

impl From<SessionStats> for StatsResponse {
    fn from(stats: SessionStats) -> Self {
        Self {
            session_id: stats.session_id,
            user_message_count: stats.user_message_count,
            premium_suggested: stats.premium_suggested,
            should_show_premium_button: stats.should_show_premium_button,
        }
    }
}

/// Get session stats
pub async fn get_session_stats(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state.chat.stats(&session_id).map_err(error_response)?;
    Ok(Json(stats.into()))
}
