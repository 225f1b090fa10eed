//! Persistence Adapter — users, sessions and chat turns behind one trait.
//!
//! `AppState` holds an `Arc<dyn Repository>`: `PgRepository` in production,
//! `MemoryRepository` for tests and database-less local runs.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::chat::{ChatRecord, NewChat};
use crate::models::session::SessionRecord;
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Returns `None` when the username is already taken.
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, AppError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn create_session(&self, username: &str, name: &str) -> Result<SessionRecord, AppError>;

    /// Only returns sessions owned by `username`.
    async fn get_session(
        &self,
        username: &str,
        session_id: i64,
    ) -> Result<Option<SessionRecord>, AppError>;

    async fn list_sessions(&self, username: &str) -> Result<Vec<SessionRecord>, AppError>;

    /// Removes the session and all of its chats. Returns `false` if it was not found.
    async fn delete_session(&self, username: &str, session_id: i64) -> Result<bool, AppError>;

    /// Single atomic insert; the store assigns `id` and `timestamp`.
    async fn append_chat(&self, chat: NewChat<'_>) -> Result<ChatRecord, AppError>;

    /// Chats of one session ordered by `(timestamp, id)` ascending.
    async fn list_chats(&self, username: &str, session_id: i64)
        -> Result<Vec<ChatRecord>, AppError>;

    async fn delete_chats(&self, session_id: i64) -> Result<u64, AppError>;

    /// Releases held resources. Called once on shutdown.
    async fn close(&self) {}
}
