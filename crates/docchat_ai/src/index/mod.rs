use docchat_core::domain::Chunk;
use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod similarity;

pub use similarity::{cosine_similarity, l2_norm};

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub chunk: Chunk,
    vector: Vec<f32>,
    norm: f64,
}

impl IndexEntry {
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub source_path: String,
    pub offset: usize,
    pub page: Option<u32>,
    pub text: String,
    pub score: f32,
}

/// Exact in-memory cosine index over one document set.
///
/// Built once, never mutated. Search is a linear scan; results are ordered by descending
/// score with ties broken by insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dims: usize,
}

impl VectorIndex {
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self, AppError> {
        if chunks.len() != vectors.len() {
            return Err(AppError::new(
                "AI_INDEX_INVALID",
                "Chunk and vector counts differ",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), vectors.len())));
        }

        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        let mut entries = Vec::with_capacity(chunks.len());
        for (ordinal, (chunk, vector)) in chunks.into_iter().zip(vectors).enumerate() {
            if vector.len() != dims || dims == 0 {
                return Err(AppError::new(
                    "AI_INDEX_INVALID",
                    "Embedding dimension mismatch across chunks",
                )
                .with_details(format!(
                    "expected={dims}; got={}; source={}; offset={}",
                    vector.len(),
                    chunk.source_path,
                    chunk.offset
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(AppError::new(
                    "AI_INDEX_INVALID",
                    "Embedding contains a non-finite component",
                )
                .with_details(format!(
                    "source={}; offset={}",
                    chunk.source_path, chunk.offset
                )));
            }
            let norm = l2_norm(&vector);
            entries.push(IndexEntry {
                id: entry_id(ordinal, &chunk),
                chunk,
                vector,
                norm,
            });
        }
        Ok(Self { entries, dims })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Top-`k` entries by cosine similarity. `k` is clamped to `1..=len`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, AppError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dims {
            return Err(AppError::new(
                "AI_INDEX_INVALID",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", self.dims, query.len())));
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(AppError::new(
                "QUERY_INVALID",
                "Query embedding contains a non-finite component",
            ));
        }
        let qnorm = l2_norm(query);
        if qnorm == 0.0 {
            return Err(AppError::new("QUERY_INVALID", "Query embedding norm is zero"));
        }
        let k = k.clamp(1, self.entries.len());

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector, qnorm, e.norm)))
            .collect();
        // Scores are finite here; the stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let e = &self.entries[i];
                SearchHit {
                    id: e.id.clone(),
                    source_path: e.chunk.source_path.clone(),
                    offset: e.chunk.offset,
                    page: e.chunk.page,
                    text: e.chunk.text.clone(),
                    score,
                }
            })
            .collect())
    }
}

fn entry_id(ordinal: usize, chunk: &Chunk) -> String {
    let payload = format!(
        "ordinal={ordinal}\nsource={}\noffset={}\ntext={}",
        chunk.source_path, chunk.offset, chunk.text
    );
    hex::encode(Sha256::digest(payload.as_bytes()))
}
