use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::errors::AppError;
use crate::models::user::{NewUser, UserResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub profile_img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /login/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password cannot be empty".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password).map_err(AppError::Internal)?;
    let user = state
        .repo
        .create_user(NewUser {
            username: req.username,
            password_hash,
            nickname: req.nickname,
            profile_img: req.profile_img.unwrap_or_default(),
        })
        .await?
        .ok_or_else(|| AppError::Conflict("Username already exists".to_string()))?;

    info!("Registered user {}", user.username);
    Ok(Json(UserResponse::from(&user)))
}

/// POST /login/token
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .repo
        .find_user(&req.username)
        .await?
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or(AppError::Unauthorized)?;

    let expires_at = Utc::now() + Duration::minutes(state.config.token_ttl_minutes);
    let access_token = issue_token(&state.config.secret, &user.username, expires_at.timestamp())
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /login/me
pub async fn handle_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
