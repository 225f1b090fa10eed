//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::llm_client::{ChatMessage, CompletionClient, LlmError};
use crate::state::AppState;
use crate::store::MemoryRepository;

enum Reply {
    Text(String),
    Error { status: u16, message: String },
}

/// Completion client that returns a fixed reply and records what it was sent.
pub struct ScriptedClient {
    reply: Reply,
    calls: AtomicUsize,
    last: Mutex<Option<(Vec<ChatMessage>, String)>>,
}

impl ScriptedClient {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self::with_reply(Reply::Error {
            status,
            message: message.to_string(),
        })
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(messages, _)| messages.clone())
            .unwrap_or_default()
    }

    pub fn last_model(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(_, model)| model.clone())
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn submit(&self, messages: &[ChatMessage], model: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((messages.to_vec(), model.to_string()));
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Error { status, message } => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "DATABASE_URL" => Some("memory".to_string()),
        "SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(llm: Arc<ScriptedClient>) -> AppState {
    AppState {
        repo: Arc::new(MemoryRepository::new()),
        llm,
        config: test_config(),
    }
}
