use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::openai::OpenAiClient;

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let req = EmbeddingsRequest {
            model: &self.model,
            input: inputs,
        };
        let resp: EmbeddingsResponse =
            self.client
                .post_json("embeddings", &req, "AI_EMBEDDINGS_FAILED", "Embeddings")?;

        // The provider tags each vector with its input position; do not trust reply order.
        let mut items = resp.data;
        items.sort_by_key(|item| item.index);
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }

    fn check_ready(&self) -> Result<(), AppError> {
        self.client.check_api_key()
    }
}
