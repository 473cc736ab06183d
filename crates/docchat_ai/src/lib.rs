pub mod chat;
pub mod chunking;
pub mod embeddings;
pub mod history;
pub mod index;
pub mod llm;
pub mod openai;
pub mod retry;
pub mod session;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::openai::{classify_status, OpenAiClient};
    use super::retry::RetryPolicy;

    fn client(url: &str) -> Result<OpenAiClient, docchat_core::error::AppError> {
        OpenAiClient::new(url, Some("sk-test"), Duration::from_secs(1))
    }

    #[test]
    fn base_url_must_be_https_or_loopback() {
        assert!(client("https://api.openai.com/v1").is_ok());
        assert!(client("https://api.openai.com/v1/").is_ok());
        assert!(client("http://127.0.0.1:8080/v1").is_ok());
        assert!(client("http://localhost:11434/v1").is_ok());

        assert!(client("http://api.openai.com/v1").is_err());
        assert!(client("ftp://api.openai.com").is_err());
        assert!(client("https://").is_err());
        assert!(client("https://user@evil.com/v1").is_err());

        // Prefix tricks on the loopback allowance.
        assert!(client("http://127.0.0.1.evil.com:8080").is_err());
        assert!(client("http://127.0.0.1@evil.com:8080").is_err());
        assert!(client("http://127.0.0.1:").is_err());
        assert!(client("http://127.0.0.1:0").is_err());
        assert!(client("http://127.0.0.1:99999").is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = client("https://api.openai.com/v1/").expect("client");
        assert_eq!(c.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn blank_key_reports_auth_missing() {
        let c = OpenAiClient::new("https://api.openai.com/v1", Some("   "), Duration::from_secs(1))
            .expect("client");
        assert!(!c.has_api_key());
        let err = c.check_api_key().expect_err("no key");
        assert_eq!(err.code, "AI_AUTH_MISSING");
        assert!(!err.retryable);
    }

    #[test]
    fn provider_statuses_map_to_error_codes() {
        let e = classify_status(401, "bad key", "AI_GENERATION_FAILED", "chat");
        assert_eq!(e.code, "AI_AUTH_REJECTED");
        assert!(!e.retryable);

        for s in [408u16, 429, 500, 503] {
            let e = classify_status(s, "", "AI_GENERATION_FAILED", "chat");
            assert_eq!(e.code, "AI_TRANSIENT", "status {s}");
            assert!(e.retryable);
        }

        let e = classify_status(400, "context too long", "AI_EMBEDDINGS_FAILED", "embeddings");
        assert_eq!(e.code, "AI_EMBEDDINGS_FAILED");
        assert!(e.details.unwrap_or_default().contains("context too long"));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let p = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            multiplier: 2.0,
        };
        assert_eq!(p.delay_after(1), Duration::from_millis(100));
        assert_eq!(p.delay_after(2), Duration::from_millis(200));
        assert_eq!(p.delay_after(3), Duration::from_millis(350));
        assert_eq!(RetryPolicy::immediate(3).delay_after(2), Duration::ZERO);
    }
}
