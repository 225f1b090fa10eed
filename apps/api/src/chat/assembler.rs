//! Conversation Assembler — rebuilds the message list for the next model call.

use crate::chat::prompts::add_instructions;
use crate::llm_client::ChatMessage;
use crate::models::chat::ChatRecord;

/// Condensed assistant turn replayed for a stored record.
/// Code artifacts and the code comment are left out.
pub fn condense(record: &ChatRecord) -> String {
    format!(
        "score: {}, recommendation: {}, knowledge: {}",
        record.score, record.recommendation, record.knowledge
    )
}

/// One user/assistant pair per record, in the given order, then the new question verbatim.
pub fn assemble(history: &[ChatRecord], question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    for record in history {
        messages.push(ChatMessage::user(record.question.clone()));
        messages.push(ChatMessage::assistant(condense(record)));
    }
    messages.push(ChatMessage::user(question));
    messages
}

/// `assemble` plus the formatting instructions on the final entry only.
pub fn prepare_messages(history: &[ChatRecord], question: &str) -> Vec<ChatMessage> {
    let mut messages = assemble(history, question);
    if let Some(last) = messages.last_mut() {
        last.content = add_instructions(&last.content);
    }
    messages
}
