use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One code file extracted from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub file_name: String,
    pub language: String,
    pub content: String,
}

/// Typed form of a model answer. The score is expected in 1..=10 but is not clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub score: i32,
    pub recommendation: String,
    pub knowledge: String,
    pub code_comment: String,
    pub code: Vec<CodeArtifact>,
}

/// A persisted question/answer turn. Serialized as-is for `ChatResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub session_id: i64,
    pub username: String,
    pub question: String,
    pub score: i32,
    pub recommendation: String,
    pub knowledge: String,
    pub code_comment: String,
    pub code: Vec<CodeArtifact>,
    pub timestamp: DateTime<Utc>,
}

/// Insert parameters for a new chat turn.
pub struct NewChat<'a> {
    pub session_id: i64,
    pub username: &'a str,
    pub question: &'a str,
    pub response: &'a StructuredResponse,
}
