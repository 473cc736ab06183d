use std::fs;
use std::path::Path;

use crate::domain::Document;
use crate::error::AppError;

pub fn load_text(path: &Path) -> Result<Document, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("DOC_LOAD_FAILED", "Failed to read text file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    // Non-UTF-8 files are still readable text for our purposes.
    let raw = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(Document::new(
        path.to_string_lossy(),
        normalize_newlines(&raw),
    ))
}

pub(crate) fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
