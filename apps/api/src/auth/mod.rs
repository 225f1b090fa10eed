//! Authentication — password hashing, signed bearer tokens and the `AuthUser` extractor.
//!
//! Token layout: `base64url("{username}:{expires_at}") "." base64url(hmac_sha256(secret, payload))`.
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`).

pub mod handlers;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("signing key rejected")]
    InvalidKey,
}

fn keyed_mac(key: &[u8]) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(key).map_err(|_| TokenError::InvalidKey)
}

/// Issues a token for `username` valid until `expires_at` (unix seconds).
pub fn issue_token(secret: &str, username: &str, expires_at: i64) -> Result<String, TokenError> {
    let payload = format!("{username}:{expires_at}");
    let mut mac = keyed_mac(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Checks signature and expiry against `now` (unix seconds); returns the username.
pub fn verify_token(secret: &str, token: &str, now: i64) -> Result<String, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac = keyed_mac(secret.as_bytes())?;
    mac.update(&payload);
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let payload = String::from_utf8(payload).map_err(|_| TokenError::Malformed)?;
    let (username, expires_at) = payload.rsplit_once(':').ok_or(TokenError::Malformed)?;
    let expires_at: i64 = expires_at.parse().map_err(|_| TokenError::Malformed)?;
    if expires_at <= now {
        return Err(TokenError::Expired);
    }
    Ok(username.to_string())
}

/// Hashes a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Checks `password` against a PHC string produced by `hash_password`.
/// Unparseable stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// The verified caller. Every session and chat handler takes one.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let username = verify_token(&state.config.secret, token, Utc::now().timestamp())
            .map_err(|e| {
                debug!("Rejected bearer token: {e}");
                AppError::Unauthorized
            })?;

        let user = state
            .repo
            .find_user(&username)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token(SECRET, "alice", NOW + 60).unwrap();
        assert_eq!(verify_token(SECRET, &token, NOW).unwrap(), "alice");
    }

    #[test]
    fn test_username_with_colon() {
        let token = issue_token(SECRET, "a:b", NOW + 60).unwrap();
        assert_eq!(verify_token(SECRET, &token, NOW).unwrap(), "a:b");
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(SECRET, "alice", NOW).unwrap();
        assert_eq!(verify_token(SECRET, &token, NOW), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(SECRET, "alice", NOW + 60).unwrap();
        assert_eq!(
            verify_token("other", &token, NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = issue_token(SECRET, "alice", NOW + 60).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!(
            "{}.{signature}",
            URL_SAFE_NO_PAD.encode(format!("mallory:{}", NOW + 60))
        );
        assert_eq!(
            verify_token(SECRET, &forged, NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        assert_eq!(verify_token(SECRET, "nodot", NOW), Err(TokenError::Malformed));
        assert_eq!(verify_token(SECRET, "!!.??", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_password_hash_verifies() {
        let stored = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
        assert!(!stored.contains("hunter2"));
        assert!(stored.starts_with("$argon2id$"));
    }

    #[test]
    fn test_password_hash_is_salted() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn test_verify_password_rejects_garbage() {
        assert!(!verify_password("pw", "no-separator"));
        assert!(!verify_password("pw", "salt$not base64!"));
        assert!(!verify_password("pw", ""));
    }

    #[test]
    fn test_fast_salted_digest_is_not_accepted() {
        // A bare `salt$digest` pair is not a PHC string and never verifies.
        let mut mac = keyed_mac(b"somesalt").unwrap();
        mac.update(b"pw");
        let legacy = format!("somesalt${}", URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()));
        assert!(!verify_password("pw", &legacy));
    }

    #[test]
    fn test_hash_uses_memory_hard_parameters() {
        let stored = hash_password("pw").unwrap();
        let parsed = PasswordHash::new(&stored).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        let params = argon2::Params::try_from(&parsed).unwrap();
        assert!(params.m_cost() >= 19 * 1024);
    }
}
