use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    pub session_id: i64,
    pub username: String,
    pub session_name: String,
}
