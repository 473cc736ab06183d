pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;

#[cfg(test)]
mod tests {
    use super::domain::Document;
    use super::error::{AppError, ErrorKind};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("AI_TRANSIENT", "rate limited").with_retryable(true);
        assert_eq!(err.code, "AI_TRANSIENT");
        assert_eq!(err.message, "rate limited");
        assert!(err.retryable);
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(err.to_string(), "[AI_TRANSIENT] rate limited");
    }

    #[test]
    fn error_kinds_follow_codes() {
        assert_eq!(AppError::new("DOC_LOAD_FAILED", "x").kind(), ErrorKind::Load);
        assert_eq!(AppError::config("x").kind(), ErrorKind::Config);
        assert_eq!(AppError::new("AI_AUTH_MISSING", "x").kind(), ErrorKind::Auth);
        assert_eq!(AppError::new("AI_AUTH_REJECTED", "x").kind(), ErrorKind::Auth);
        assert_eq!(AppError::new("AI_EMBEDDINGS_FAILED", "x").kind(), ErrorKind::Embedding);
        assert_eq!(AppError::new("AI_GENERATION_FAILED", "x").kind(), ErrorKind::Generation);
        assert_eq!(AppError::new("SOMETHING_ELSE", "x").kind(), ErrorKind::Other);
    }

    #[test]
    fn app_error_serializes_for_ui() {
        let err = AppError::new("DOC_NONE_LOADED", "No documents could be loaded")
            .with_details("a.txt: missing");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["code"], "DOC_NONE_LOADED");
        assert_eq!(json["details"], "a.txt: missing");
        assert_eq!(json["retryable"], false);
        let back: AppError = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, err);
    }

    #[test]
    fn page_lookup_uses_page_starts() {
        let mut doc = Document::new("a.pdf", "x".repeat(300));
        assert_eq!(doc.page_at(10), None);

        doc.page_starts = vec![0, 100, 250];
        assert_eq!(doc.page_at(0), Some(1));
        assert_eq!(doc.page_at(99), Some(1));
        assert_eq!(doc.page_at(100), Some(2));
        assert_eq!(doc.page_at(299), Some(3));
    }
}
