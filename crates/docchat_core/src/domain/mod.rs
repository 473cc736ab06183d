use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw text of one loaded file.
///
/// Notes:
/// - `page_starts` holds the character offset at which each PDF page begins (empty for plain
///   text), so chunk offsets can be mapped back to a page.
/// - Documents are discarded once chunked; chunks carry `source_path` forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub source_path: String,
    pub raw_text: String,
    #[serde(default)]
    pub page_starts: Vec<usize>,
}

impl Document {
    pub fn new(source_path: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            raw_text: raw_text.into(),
            page_starts: Vec::new(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.raw_text.chars().count()
    }

    pub fn page_count(&self) -> usize {
        self.page_starts.len()
    }

    /// 1-based page containing the character at `offset`, if this document is paged.
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        if self.page_starts.is_empty() {
            return None;
        }
        let idx = match self.page_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        Some(idx as u32 + 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source_path: String,
    /// Character offset of `text` within the source document.
    pub offset: usize,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: String,
    pub error: AppError,
}

/// Outcome of loading a document set: what loaded, what was skipped, what failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn total_chars(&self) -> usize {
        self.documents.iter().map(Document::char_count).sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What a session remembers about its document set once the raw text has been chunked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub sources: Vec<String>,
    pub total_chars: usize,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<LoadFailure>,
}

impl From<&LoadReport> for LoadSummary {
    fn from(report: &LoadReport) -> Self {
        Self {
            sources: report
                .documents
                .iter()
                .map(|d| d.source_path.clone())
                .collect(),
            total_chars: report.total_chars(),
            skipped: report.skipped.clone(),
            failures: report.failures.clone(),
        }
    }
}
