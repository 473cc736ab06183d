use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape used across crates and handed to whatever UI sits on top.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

/// Coarse error families derived from `AppError::code`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Load,
    Config,
    Auth,
    Transient,
    Embedding,
    Generation,
    Session,
    Other,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            "DOC_LOAD_FAILED" | "DOC_NONE_LOADED" => ErrorKind::Load,
            "CONFIG_INVALID" => ErrorKind::Config,
            "AI_AUTH_MISSING" | "AI_AUTH_REJECTED" => ErrorKind::Auth,
            "AI_TRANSIENT" => ErrorKind::Transient,
            "AI_EMBEDDINGS_FAILED" | "AI_INDEX_INVALID" => ErrorKind::Embedding,
            "AI_GENERATION_FAILED" => ErrorKind::Generation,
            "SESSION_NOT_READY" | "SESSION_SUPERSEDED" | "QUERY_INVALID" => ErrorKind::Session,
            _ => ErrorKind::Other,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new("CONFIG_INVALID", message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(d) = self.details.as_ref() {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
