use std::path::Path;

use tracing::{debug, warn};

use super::text::normalize_newlines;
use crate::domain::Document;
use crate::error::AppError;

/// Extract a PDF page by page and concatenate the pages, recording where each one starts.
///
/// A page whose text cannot be extracted contributes nothing; the file only fails when it
/// cannot be opened or parsed at all.
pub fn load_pdf(path: &Path) -> Result<Document, AppError> {
    let pdf = lopdf::Document::load(path).map_err(|e| {
        AppError::new("DOC_LOAD_FAILED", "Failed to open PDF")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;

    let mut raw_text = String::new();
    let mut page_starts = Vec::new();
    let mut chars = 0usize;
    for page_number in pdf.get_pages().keys() {
        let text = match pdf.extract_text(&[*page_number]) {
            Ok(t) => normalize_newlines(&t),
            Err(e) => {
                warn!(path = %path.display(), page = page_number, err = %e, "failed to extract PDF page text");
                String::new()
            }
        };
        if !raw_text.is_empty() && !raw_text.ends_with('\n') {
            raw_text.push('\n');
            chars += 1;
        }
        page_starts.push(chars);
        chars += text.chars().count();
        raw_text.push_str(&text);
    }
    debug!(path = %path.display(), pages = page_starts.len(), chars, "extracted PDF");

    Ok(Document {
        source_path: path.to_string_lossy().to_string(),
        raw_text,
        page_starts,
    })
}
