use std::time::Duration;

use docchat_core::config::{validate_base_url, DocChatConfig};
use docchat_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Shared HTTP client for an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiClient {
    /// The key may be absent here; every request checks for it and fails with `AI_AUTH_MISSING`.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Ok(Self {
            base_url,
            api_key,
            timeout,
        })
    }

    pub fn from_config(cfg: &DocChatConfig) -> Result<Self, AppError> {
        Self::new(
            &cfg.api_base_url,
            cfg.api_key.as_deref(),
            Duration::from_millis(cfg.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn check_api_key(&self) -> Result<(), AppError> {
        self.bearer().map(|_| ())
    }

    fn bearer(&self) -> Result<String, AppError> {
        match self.api_key.as_deref() {
            Some(key) => Ok(format!("Bearer {key}")),
            None => Err(AppError::new(
                "AI_AUTH_MISSING",
                "No API key configured for the model provider",
            )
            .with_details("set OPENAI_API_KEY or api_key in docchat.toml")),
        }
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON reply.
    ///
    /// `failed_code` is used for non-retryable provider errors; auth and transient failures
    /// get their own codes so the retry layer can tell them apart.
    pub(crate) fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        failed_code: &str,
        what: &str,
    ) -> Result<Resp, AppError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let auth = self.bearer()?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::new(failed_code, format!("Failed to encode {what} request"))
                .with_details(e.to_string())
        })?;

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &auth)
            .send_json(payload);

        match resp {
            Ok(r) => r.into_json::<Resp>().map_err(|e| {
                AppError::new(failed_code, format!("Failed to decode {what} response"))
                    .with_details(e.to_string())
            }),
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(classify_status(status, &body, failed_code, what))
            }
            Err(ureq::Error::Transport(t)) => Err(AppError::new(
                "AI_TRANSIENT",
                format!("Failed to reach {what} endpoint"),
            )
            .with_details(t.to_string())
            .with_retryable(true)),
        }
    }
}

/// Map a non-2xx provider status onto the error taxonomy.
pub fn classify_status(status: u16, body: &str, failed_code: &str, what: &str) -> AppError {
    let details = format!("status={status}; body={}", truncate_chars(body.trim(), 300));
    match status {
        401 | 403 => AppError::new("AI_AUTH_REJECTED", "Model provider rejected the API key")
            .with_details(details),
        408 | 409 | 429 | 500..=599 => AppError::new(
            "AI_TRANSIENT",
            format!("{what} request was throttled or failed upstream"),
        )
        .with_details(details)
        .with_retryable(true),
        _ => AppError::new(failed_code, format!("{what} request failed")).with_details(details),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
