//! Layered configuration.
//!
//! Merges compiled defaults, an optional TOML file, `DOCCHAT_*` environment variables and
//! `OPENAI_API_KEY` (mapped onto `api_key`), then validates eagerly so that bad chunking or
//! retry settings are rejected before any document is embedded.
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_CONFIG_FILE: &str = "docchat.toml";

/// Provider-side cap on inputs per embeddings request.
pub const MAX_EMBEDDING_BATCH: usize = 2048;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocChatConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_batch_size: usize,
    pub max_prompt_tokens: usize,
    pub condense_follow_ups: bool,
    pub request_timeout_ms: u64,
    pub retry: RetrySettings,
}

impl Default for DocChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            embedding_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            chunk_size: 1000,
            chunk_overlap: 40,
            top_k: 2,
            embedding_batch_size: 100,
            max_prompt_tokens: 3000,
            condense_follow_ups: false,
            request_timeout_ms: 30_000,
            retry: RetrySettings::default(),
        }
    }
}

impl DocChatConfig {
    /// Load from `path` (or `docchat.toml` in the working directory) plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let figment = Figment::from(Serialized::defaults(DocChatConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("DOCCHAT_").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "api_key".into()),
            );
        Self::from_figment(figment)
    }

    /// Extract and validate from an already assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self, AppError> {
        let mut cfg: DocChatConfig = figment.extract().map_err(|e| {
            AppError::config("Failed to read configuration").with_details(e.to_string())
        })?;
        cfg.api_base_url = cfg.api_base_url.trim_end_matches('/').to_string();
        if cfg.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            cfg.api_key = None;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::config("chunk_size must be greater than zero"));
        }
        if self.chunk_size <= self.chunk_overlap {
            return Err(AppError::config("chunk_size must exceed chunk_overlap").with_details(
                format!(
                    "chunk_size={}; chunk_overlap={}",
                    self.chunk_size, self.chunk_overlap
                ),
            ));
        }
        if self.top_k == 0 {
            return Err(AppError::config("top_k must be at least 1"));
        }
        if self.embedding_batch_size == 0 || self.embedding_batch_size > MAX_EMBEDDING_BATCH {
            return Err(
                AppError::config("embedding_batch_size out of range").with_details(format!(
                    "embedding_batch_size={}; allowed=1..={MAX_EMBEDDING_BATCH}",
                    self.embedding_batch_size
                )),
            );
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::config("temperature must be within 0.0..=2.0")
                .with_details(format!("temperature={}", self.temperature)));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::config("retry.max_attempts must be at least 1"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(AppError::config("retry.multiplier must be >= 1.0")
                .with_details(format!("multiplier={}", self.retry.multiplier)));
        }
        validate_base_url(&self.api_base_url)?;
        Ok(())
    }
}

/// Remote providers must be reached over TLS; plain HTTP is only accepted for a local
/// OpenAI-compatible server on loopback.
pub fn validate_base_url(base_url: &str) -> Result<(), AppError> {
    let base_url = base_url.trim_end_matches('/');
    let invalid = || {
        AppError::config("api_base_url must be https:// or a loopback http:// address")
            .with_details(format!("api_base_url={base_url}"))
    };

    if let Some(rest) = base_url.strip_prefix("https://") {
        let host = rest.split('/').next().unwrap_or("");
        if host.is_empty() || host.contains('@') {
            return Err(invalid());
        }
        return Ok(());
    }

    let rest = base_url.strip_prefix("http://").ok_or_else(invalid)?;
    let authority = rest.split('/').next().unwrap_or("");
    let (host, port) = match authority.split_once(':') {
        Some((h, p)) => (h, Some(p)),
        None => (authority, None),
    };
    if host != "127.0.0.1" && host != "localhost" {
        return Err(invalid());
    }
    if let Some(p) = port {
        match p.parse::<u16>() {
            Ok(n) if n > 0 => {}
            _ => return Err(invalid()),
        }
    }
    Ok(())
}
