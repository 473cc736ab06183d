use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatModel};
use crate::openai::OpenAiClient;

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatModel for OpenAiChatModel {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let req = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        let resp: CompletionResponse = self.client.post_json(
            "chat/completions",
            &req,
            "AI_GENERATION_FAILED",
            "Chat completion",
        )?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AppError::new(
                "AI_GENERATION_FAILED",
                "Chat completion response was empty",
            ));
        }
        Ok(text)
    }

    fn check_ready(&self) -> Result<(), AppError> {
        self.client.check_api_key()
    }
}
