//! In-memory backend — used by tests and by `DATABASE_URL=memory`.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::Repository;
use crate::errors::AppError;
use crate::models::chat::{ChatRecord, NewChat};
use crate::models::session::SessionRecord;
use crate::models::user::{NewUser, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<SessionRecord>,
    chats: Vec<ChatRecord>,
    next_session_id: i64,
    next_chat_id: i64,
}

impl Tables {
    /// Drops every chat of `session_id`, returning how many went.
    fn remove_chats(&mut self, session_id: i64) -> u64 {
        let before = self.chats.len();
        self.chats.retain(|c| c.session_id != session_id);
        (before - self.chats.len()) as u64
    }
}

/// Stores everything in vectors behind a single lock. Data is lost on restart.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Ok(None);
        }
        let user = User {
            username: user.username,
            password_hash: user.password_hash,
            nickname: user.nickname,
            profile_img: user.profile_img,
        };
        tables.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_session(&self, username: &str, name: &str) -> Result<SessionRecord, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_session_id += 1;
        let session = SessionRecord {
            session_id: tables.next_session_id,
            username: username.to_string(),
            session_name: name.to_string(),
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(
        &self,
        username: &str,
        session_id: i64,
    ) -> Result<Option<SessionRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.session_id == session_id && s.username == username)
            .cloned())
    }

    async fn list_sessions(&self, username: &str) -> Result<Vec<SessionRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.username == username)
            .cloned()
            .collect())
    }

    async fn delete_session(&self, username: &str, session_id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|s| !(s.session_id == session_id && s.username == username));
        if tables.sessions.len() == before {
            return Ok(false);
        }
        tables.remove_chats(session_id);
        Ok(true)
    }

    async fn append_chat(&self, chat: NewChat<'_>) -> Result<ChatRecord, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_chat_id += 1;
        let record = ChatRecord {
            id: tables.next_chat_id,
            session_id: chat.session_id,
            username: chat.username.to_string(),
            question: chat.question.to_string(),
            score: chat.response.score,
            recommendation: chat.response.recommendation.clone(),
            knowledge: chat.response.knowledge.clone(),
            code_comment: chat.response.code_comment.clone(),
            code: chat.response.code.clone(),
            timestamp: Utc::now(),
        };
        tables.chats.push(record.clone());
        Ok(record)
    }

    async fn list_chats(
        &self,
        username: &str,
        session_id: i64,
    ) -> Result<Vec<ChatRecord>, AppError> {
        let tables = self.tables.read().await;
        let mut chats: Vec<ChatRecord> = tables
            .chats
            .iter()
            .filter(|c| c.session_id == session_id && c.username == username)
            .cloned()
            .collect();
        chats.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(chats)
    }

    async fn delete_chats(&self, session_id: i64) -> Result<u64, AppError> {
        Ok(self.tables.write().await.remove_chats(session_id))
    }
}
