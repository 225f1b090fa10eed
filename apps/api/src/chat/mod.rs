// Ask flow: history → message list → completion → parse → persist.
// All model calls go through llm_client — no direct HTTP here.

pub mod assembler;
pub mod parser;
pub mod prompts;

use tracing::{info, warn};

use crate::chat::assembler::prepare_messages;
use crate::chat::parser::parse_completion;
use crate::errors::AppError;
use crate::llm_client::CompletionClient;
use crate::models::chat::{ChatRecord, NewChat};
use crate::store::Repository;

/// Runs one question/answer turn in a session owned by `username`.
///
/// The session is checked before the model is called. A remote failure or an
/// unparseable completion returns an error and stores nothing.
pub async fn ask_in_session(
    repo: &dyn Repository,
    llm: &dyn CompletionClient,
    model: &str,
    username: &str,
    session_id: i64,
    question: &str,
) -> Result<ChatRecord, AppError> {
    repo.get_session(username, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let history = repo.list_chats(username, session_id).await?;
    let messages = prepare_messages(&history, question);

    let raw = llm.submit(&messages, model).await.map_err(|e| {
        warn!(session_id, "Completion request failed: {e}");
        AppError::Llm(e.to_string())
    })?;

    let response = parse_completion(&raw).inspect_err(|e| {
        warn!(session_id, "Discarding malformed completion: {e}");
    })?;

    let record = repo
        .append_chat(NewChat {
            session_id,
            username,
            question,
            response: &response,
        })
        .await?;

    info!(
        session_id,
        chat_id = record.id,
        score = record.score,
        files = record.code.len(),
        "Stored chat turn (history: {} turns)",
        history.len()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::store::MemoryRepository;
    use crate::test_support::ScriptedClient;

    const GOOD: &str = "::Section:: 6 ::Section:: 어떤 UI? ::Section:: UI는 화면입니다 \
        ::Section:: 예시 ::filename:: main.py\n```python\nprint(1)\n```\n";

    #[tokio::test]
    async fn test_unknown_session_skips_remote_call() {
        let repo = MemoryRepository::new();
        let llm = ScriptedClient::replying(GOOD);

        let err = ask_in_session(&repo, &llm, "gpt-4", "alice", 99, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_session_is_not_found() {
        let repo = MemoryRepository::new();
        let session = repo.create_session("bob", "bob's").await.unwrap();
        let llm = ScriptedClient::replying(GOOD);

        let err = ask_in_session(&repo, &llm, "gpt-4", "alice", session.session_id, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_persists_and_replays_history() {
        let repo = MemoryRepository::new();
        let session = repo.create_session("alice", "water").await.unwrap();
        let llm = ScriptedClient::replying(GOOD);

        let first = ask_in_session(&repo, &llm, "gpt-4", "alice", session.session_id, "Q1")
            .await
            .unwrap();
        assert_eq!(first.score, 6);
        assert_eq!(first.code[0].language, "python");

        ask_in_session(&repo, &llm, "gpt-4", "alice", session.session_id, "Q2")
            .await
            .unwrap();

        let sent = llm.last_messages();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].content, "Q1");
        assert_eq!(sent[1].role, Role::Assistant);
        assert!(sent[1].content.starts_with("score: 6, recommendation: 어떤 UI?"));
        assert!(sent[2].content.starts_with("Q2 I am product manager"));
        assert_eq!(llm.last_model().as_deref(), Some("gpt-4"));
        assert_eq!(repo.list_chats("alice", session.session_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_completion_persists_nothing() {
        let repo = MemoryRepository::new();
        let session = repo.create_session("alice", "s").await.unwrap();
        let llm = ScriptedClient::replying("Sorry, I cannot help with that.");

        let err = ask_in_session(&repo, &llm, "gpt-4", "alice", session.session_id, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedCompletion(_)));
        assert!(repo.list_chats("alice", session.session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_persists_nothing() {
        let repo = MemoryRepository::new();
        let session = repo.create_session("alice", "s").await.unwrap();
        let llm = ScriptedClient::failing(503, "overloaded");

        let err = ask_in_session(&repo, &llm, "gpt-4", "alice", session.session_id, "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(llm.call_count(), 1);
        assert!(repo.list_chats("alice", session.session_id).await.unwrap().is_empty());
    }
}
