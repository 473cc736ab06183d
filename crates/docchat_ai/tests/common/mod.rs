#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use docchat_ai::embeddings::Embedder;
use docchat_ai::llm::{ChatMessage, ChatModel};
use docchat_core::config::DocChatConfig;
use docchat_core::error::AppError;

pub const VOCAB: [&str; 8] = ["sky", "blue", "grass", "green", "color", "the", "is", "what"];

/// Bag-of-words over a fixed vocabulary; unknown words are ignored.
pub struct VocabEmbedder;

pub fn vocab_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCAB.len()];
    for word in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if let Some(i) = VOCAB.iter().position(|w| *w == word) {
            v[i] += 1.0;
        }
    }
    v
}

impl Embedder for VocabEmbedder {
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(inputs.iter().map(|t| vocab_vector(t)).collect())
    }
}

/// `VocabEmbedder` that first fails with each queued error, one per call.
#[derive(Default)]
pub struct FlakyEmbedder {
    failures: Mutex<VecDeque<AppError>>,
    calls: Mutex<usize>,
}

impl FlakyEmbedder {
    pub fn failing_with(errors: Vec<AppError>) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Embedder for FlakyEmbedder {
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        VocabEmbedder.embed(inputs)
    }
}

/// Replays queued replies in order, then answers "ok". Records every request.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_err(&self, err: AppError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// System prompt of the most recent request.
    pub fn last_system(&self) -> String {
        self.calls
            .lock()
            .unwrap()
            .last()
            .and_then(|m| m.first())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

impl ChatModel for ScriptedChat {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

pub fn transient() -> AppError {
    AppError::new("AI_TRANSIENT", "rate limited").with_retryable(true)
}

pub fn small_chunks_config() -> DocChatConfig {
    DocChatConfig {
        chunk_size: 20,
        chunk_overlap: 5,
        top_k: 1,
        ..DocChatConfig::default()
    }
}

pub fn write_doc(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write doc");
    path
}
