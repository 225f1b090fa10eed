//! Axum route handlers for the Session API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::chat::ask_in_session;
use crate::errors::AppError;
use crate::models::chat::ChatRecord;
use crate::models::session::SessionRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewSessionQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionIdQuery {
    pub session_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    pub session_id: i64,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub chats: Vec<ChatRecord>,
}

fn session_not_found() -> AppError {
    AppError::NotFound("Session not found".to_string())
}

/// GET /session/new?name=
pub async fn handle_new_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<NewSessionQuery>,
) -> Result<Json<SessionRecord>, AppError> {
    if params.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let session = state
        .repo
        .create_session(&user.username, &params.name)
        .await?;
    Ok(Json(session))
}

/// GET /session/get/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<i64>,
) -> Result<Json<SessionRecord>, AppError> {
    state
        .repo
        .get_session(&user.username, session_id)
        .await?
        .map(Json)
        .ok_or_else(session_not_found)
}

/// GET /session/list
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.repo.list_sessions(&user.username).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /session/delete?session_id=
pub async fn handle_delete_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SessionIdQuery>,
) -> Result<Json<Value>, AppError> {
    if !state
        .repo
        .delete_session(&user.username, params.session_id)
        .await?
    {
        return Err(session_not_found());
    }
    Ok(Json(json!({ "status": "ok" })))
}

/// GET /session/history/:session_id
///
/// Chat turns in the order they are replayed to the model.
pub async fn handle_session_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<i64>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    state
        .repo
        .get_session(&user.username, session_id)
        .await?
        .ok_or_else(session_not_found)?;
    let chats = state.repo.list_chats(&user.username, session_id).await?;
    Ok(Json(ChatHistoryResponse { chats }))
}

/// GET /session/ask?session_id=&question=
///
/// Full turn: history replay → completion → parse → persist.
pub async fn handle_ask(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<AskQuery>,
) -> Result<Json<ChatRecord>, AppError> {
    if params.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let record = ask_in_session(
        state.repo.as_ref(),
        state.llm.as_ref(),
        &state.config.openai_model,
        &user.username,
        params.session_id,
        &params.question,
    )
    .await?;
    Ok(Json(record))
}
