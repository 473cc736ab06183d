use std::sync::Arc;

use docchat_core::config::DocChatConfig;
use docchat_core::domain::Turn;
use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embeddings::{embed_texts, Embedder};
use crate::index::{SearchHit, VectorIndex};
use crate::llm::{ChatMessage, ChatModel};
use crate::retry::{exhausted, RetryPolicy};

pub mod prompts;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchHit>,
    /// History turns left out of the prompt to stay within the token budget.
    pub dropped_turns: usize,
}

#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub top_k: usize,
    pub max_prompt_tokens: usize,
    pub condense_follow_ups: bool,
    pub retry: RetryPolicy,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&DocChatConfig::default())
    }
}

impl From<&DocChatConfig> for ChainSettings {
    fn from(cfg: &DocChatConfig) -> Self {
        Self {
            top_k: cfg.top_k,
            max_prompt_tokens: cfg.max_prompt_tokens,
            condense_follow_ups: cfg.condense_follow_ups,
            retry: RetryPolicy::from(&cfg.retry),
        }
    }
}

/// One conversational turn: embed the question, retrieve, then prompt the chat model.
///
/// Holds no per-conversation state; history is passed in by the caller.
#[derive(Clone)]
pub struct RetrievalChain {
    embedder: Arc<dyn Embedder>,
    chat_model: Arc<dyn ChatModel>,
    settings: ChainSettings,
}

impl RetrievalChain {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            embedder,
            chat_model,
            settings,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.settings.retry = retry;
        self
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    pub fn generate(
        &self,
        index: &VectorIndex,
        question: &str,
        history: &[Turn],
    ) -> Result<Answer, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::new("QUERY_INVALID", "Question must not be empty"));
        }
        self.embedder.check_ready()?;
        self.chat_model.check_ready()?;

        let retrieval_question = if self.settings.condense_follow_ups && !history.is_empty() {
            self.condense(question, history)?
        } else {
            question.to_string()
        };

        let retry = &self.settings.retry;
        let query_vector = embed_texts(self.embedder.as_ref(), &[retrieval_question], 1, retry)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Query embedding response was empty")
            })?;
        let hits = index.search(&query_vector, self.settings.top_k)?;
        debug!(hits = hits.len(), "retrieved context");

        let system = prompts::answer_system_prompt(&prompts::context_blocks(&hits));
        let (messages, dropped_turns) =
            prompts::build_messages(&system, history, question, self.settings.max_prompt_tokens);
        if dropped_turns > 0 {
            warn!(dropped_turns, "trimmed oldest turns to fit the prompt budget");
        }

        let text = self.complete(&messages)?;
        info!(
            sources = hits.len(),
            history = history.len() - dropped_turns,
            "answered question"
        );
        Ok(Answer {
            text: text.trim().to_string(),
            sources: hits,
            dropped_turns,
        })
    }

    fn condense(&self, question: &str, history: &[Turn]) -> Result<String, AppError> {
        let prompt = prompts::condense_question_prompt(history, question);
        let rewritten = self.complete(&[ChatMessage::user(prompt)])?;
        let rewritten = rewritten.trim();
        debug!(standalone = rewritten, "condensed follow-up question");
        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(rewritten.to_string())
        }
    }

    fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let retry = &self.settings.retry;
        retry
            .run("chat", || self.chat_model.complete(messages))
            .map_err(|e| {
                exhausted(
                    e,
                    "AI_GENERATION_FAILED",
                    "Failed to generate an answer",
                    retry.max_attempts,
                )
            })
    }
}
