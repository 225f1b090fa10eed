use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use tracing::info;

use super::Repository;
use crate::errors::AppError;
use crate::models::chat::{ChatRecord, CodeArtifact, NewChat};
use crate::models::session::SessionRecord;
use crate::models::user::{NewUser, User};

/// Row shape of `chats`; `code` is a JSONB array that keeps artifact order.
#[derive(Debug, FromRow)]
struct ChatRow {
    id: i64,
    session_id: i64,
    username: String,
    question: String,
    score: i32,
    recommendation: String,
    knowledge: String,
    code_comment: String,
    code: Json<Vec<CodeArtifact>>,
    timestamp: DateTime<Utc>,
}

impl From<ChatRow> for ChatRecord {
    fn from(row: ChatRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            username: row.username,
            question: row.question,
            score: row.score,
            recommendation: row.recommendation,
            knowledge: row.knowledge,
            code_comment: row.code_comment,
            code: row.code.0,
            timestamp: row.timestamp,
        }
    }
}

const CHAT_COLUMNS: &str = "id, session_id, username, question, score, recommendation, \
    knowledge, code_comment, code, \"timestamp\"";

/// PostgreSQL-backed repository. Owns the pool; `close` drains it.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Shared by `delete_chats` and the `delete_session` transaction.
async fn delete_session_chats<'e>(
    executor: impl PgExecutor<'e>,
    session_id: i64,
) -> Result<u64, sqlx::Error> {
    Ok(sqlx::query("DELETE FROM chats WHERE session_id = $1")
        .bind(session_id)
        .execute(executor)
        .await?
        .rows_affected())
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, nickname, profile_img)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING username, password_hash, nickname, profile_img
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(&user.profile_img)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT username, password_hash, nickname, profile_img FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_session(&self, username: &str, name: &str) -> Result<SessionRecord, AppError> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (username, session_name)
            VALUES ($1, $2)
            RETURNING id AS session_id, username, session_name
            "#,
        )
        .bind(username)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        info!("Created session {} for {}", session.session_id, username);
        Ok(session)
    }

    async fn get_session(
        &self,
        username: &str,
        session_id: i64,
    ) -> Result<Option<SessionRecord>, AppError> {
        Ok(sqlx::query_as::<_, SessionRecord>(
            "SELECT id AS session_id, username, session_name FROM sessions WHERE id = $1 AND username = $2",
        )
        .bind(session_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_sessions(&self, username: &str) -> Result<Vec<SessionRecord>, AppError> {
        Ok(sqlx::query_as::<_, SessionRecord>(
            "SELECT id AS session_id, username, session_name FROM sessions WHERE username = $1 ORDER BY id ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_session(&self, username: &str, session_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i64> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE id = $1 AND username = $2 FOR UPDATE")
                .bind(session_id)
                .bind(username)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Ok(false);
        }

        let chats = delete_session_chats(&mut *tx, session_id).await?;
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Deleted session {session_id} and {chats} chats for {username}");
        Ok(true)
    }

    async fn append_chat(&self, chat: NewChat<'_>) -> Result<ChatRecord, AppError> {
        let response = chat.response;
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            r#"
            INSERT INTO chats
                (session_id, username, question, score, recommendation, knowledge, code_comment, code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(chat.session_id)
        .bind(chat.username)
        .bind(chat.question)
        .bind(response.score)
        .bind(&response.recommendation)
        .bind(&response.knowledge)
        .bind(&response.code_comment)
        .bind(Json(&response.code))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_chats(
        &self,
        username: &str,
        session_id: i64,
    ) -> Result<Vec<ChatRecord>, AppError> {
        let rows = sqlx::query_as::<_, ChatRow>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE session_id = $1 AND username = $2 \
             ORDER BY \"timestamp\" ASC, id ASC"
        ))
        .bind(session_id)
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatRecord::from).collect())
    }

    async fn delete_chats(&self, session_id: i64) -> Result<u64, AppError> {
        Ok(delete_session_chats(&self.pool, session_id).await?)
    }

    async fn close(&self) {
        info!("Closing PostgreSQL connection pool");
        self.pool.close().await;
    }
}
