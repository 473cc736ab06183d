use docchat_core::error::AppError;
use tracing::debug;

use crate::retry::{exhausted, RetryPolicy};

pub trait Embedder: Send + Sync {
    /// Embed one request's worth of inputs; the reply has one vector per input, in order.
    fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    /// Cheap local readiness check run before any build or query (e.g. credential present).
    fn check_ready(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub mod openai_embed;

/// Embed `texts` in batches of at most `batch_size`, retrying transient failures per batch.
///
/// Enforces that the provider returned one vector per input and that every vector has the
/// same dimensionality.
pub fn embed_texts(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    retry: &RetryPolicy,
) -> Result<Vec<Vec<f32>>, AppError> {
    embed_texts_until(embedder, texts, batch_size, retry, &|| false)
}

/// Like [`embed_texts`], but checks `abandon` before each batch and stops early with
/// `SESSION_SUPERSEDED` once it returns true.
pub fn embed_texts_until(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    retry: &RetryPolicy,
    abandon: &dyn Fn() -> bool,
) -> Result<Vec<Vec<f32>>, AppError> {
    embedder.check_ready()?;
    let batch_size = batch_size.max(1);
    let mut out: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    let mut dims: Option<usize> = None;

    for (batch_no, batch) in texts.chunks(batch_size).enumerate() {
        if abandon() {
            return Err(AppError::new(
                "SESSION_SUPERSEDED",
                "Build abandoned because a newer document set was submitted",
            ));
        }
        debug!(batch = batch_no, inputs = batch.len(), "embedding batch");

        let vectors = retry
            .run("embed", || embedder.embed(batch))
            .map_err(|e| {
                exhausted(
                    e,
                    "AI_EMBEDDINGS_FAILED",
                    "Failed to compute embeddings",
                    retry.max_attempts,
                )
            })?;

        if vectors.len() != batch.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedding response count does not match request",
            )
            .with_details(format!(
                "batch={batch_no}; expected={}; got={}",
                batch.len(),
                vectors.len()
            )));
        }
        for v in vectors {
            if v.is_empty() {
                return Err(AppError::new(
                    "AI_EMBEDDINGS_FAILED",
                    "Embedding response contained an empty vector",
                ));
            }
            match dims {
                Some(d) if d != v.len() => {
                    return Err(AppError::new(
                        "AI_EMBEDDINGS_FAILED",
                        "Embedding dimension changed between inputs",
                    )
                    .with_details(format!("expected={d}; got={}", v.len())));
                }
                Some(_) => {}
                None => dims = Some(v.len()),
            }
            out.push(v);
        }
    }

    Ok(out)
}
