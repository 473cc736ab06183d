use docchat_core::domain::Turn;

use crate::index::SearchHit;
use crate::llm::ChatMessage;

/// Rough per-message framing cost charged by chat-completion APIs.
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

pub fn context_blocks(hits: &[SearchHit]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for hit in hits {
        let header = match hit.page {
            Some(p) => format!("[source: {} page {}]", hit.source_path, p),
            None => format!("[source: {}]", hit.source_path),
        };
        blocks.push(format!("{header}\n{}", hit.text));
    }
    blocks.join("\n\n---\n\n")
}

pub fn answer_system_prompt(context: &str) -> String {
    format!(
        r#"You are a helpful assistant answering questions about the user's uploaded documents.

Rules:
1) Answer using ONLY the context excerpts below and the earlier conversation.
2) If the excerpts do not contain the answer, say that you don't know. Do not make one up.
3) Keep answers concise.

Context excerpts:
{context}
"#
    )
}

pub fn condense_question_prompt(history: &[Turn], question: &str) -> String {
    let mut transcript = String::new();
    for t in history {
        transcript.push_str(&format!("Human: {}\nAssistant: {}\n", t.question, t.answer));
    }
    format!(
        r#"Rewrite the follow-up question so it can be understood without the conversation below.
Return only the rewritten question.

Conversation:
{transcript}
Follow-up question: {question}
Standalone question:"#
    )
}

/// Assemble the chat request, dropping the oldest history turns until the estimate fits
/// `max_tokens`. The system prompt and the new question are always kept.
///
/// Returns the messages and how many turns were dropped.
pub fn build_messages(
    system_prompt: &str,
    history: &[Turn],
    question: &str,
    max_tokens: usize,
) -> (Vec<ChatMessage>, usize) {
    let fixed = estimate_tokens(system_prompt)
        + estimate_tokens(question)
        + 2 * MESSAGE_OVERHEAD_TOKENS;
    let turn_cost = |t: &Turn| {
        estimate_tokens(&t.question) + estimate_tokens(&t.answer) + 2 * MESSAGE_OVERHEAD_TOKENS
    };

    let mut total = fixed + history.iter().map(turn_cost).sum::<usize>();
    let mut dropped = 0usize;
    while dropped < history.len() && total > max_tokens {
        total -= turn_cost(&history[dropped]);
        dropped += 1;
    }

    let mut messages = Vec::with_capacity(2 + 2 * (history.len() - dropped));
    messages.push(ChatMessage::system(system_prompt));
    for t in &history[dropped..] {
        messages.push(ChatMessage::user(t.question.clone()));
        messages.push(ChatMessage::assistant(t.answer.clone()));
    }
    messages.push(ChatMessage::user(question));
    (messages, dropped)
}
