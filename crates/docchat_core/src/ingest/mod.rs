use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{Document, LoadFailure, LoadReport, SkippedFile};
use crate::error::AppError;

pub mod pdf;
pub mod text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Load every supported file named by `paths`.
///
/// Directories are walked recursively and contribute their `.pdf`/`.txt` files in sorted
/// order. Unsupported files are recorded as skipped, unreadable ones as failures; neither
/// stops the remaining files from loading.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut report = LoadReport::default();
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

    for path in expand_inputs(paths, &mut report) {
        if !seen.insert(path.clone()) {
            continue;
        }
        let shown = path.to_string_lossy().to_string();
        let Some(format) = DocumentFormat::from_path(&path) else {
            warn!(path = %shown, "skipping unsupported file type");
            report.skipped.push(SkippedFile {
                path: shown,
                reason: "unsupported extension".to_string(),
            });
            continue;
        };

        match load_one(&path, format) {
            Ok(doc) => report.documents.push(doc),
            Err(error) => {
                warn!(path = %shown, %error, "failed to load document");
                report.failures.push(LoadFailure {
                    path: shown,
                    error,
                });
            }
        }
    }

    info!(
        documents = report.documents.len(),
        chars = report.total_chars(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "loaded document set"
    );
    report
}

pub fn load_one(path: &Path, format: DocumentFormat) -> Result<Document, AppError> {
    match format {
        DocumentFormat::Text => text::load_text(path),
        DocumentFormat::Pdf => pdf::load_pdf(path),
    }
}

fn expand_inputs<P: AsRef<Path>>(paths: &[P], report: &mut LoadReport) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for p in paths {
        let p = p.as_ref();
        if !p.is_dir() {
            out.push(p.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(p) {
            match entry {
                Ok(e) if e.file_type().is_file() => {
                    if DocumentFormat::from_path(e.path()).is_some() {
                        found.push(e.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e
                        .path()
                        .unwrap_or(p)
                        .to_string_lossy()
                        .to_string();
                    report.failures.push(LoadFailure {
                        path: path.clone(),
                        error: AppError::new("DOC_LOAD_FAILED", "Failed to read directory entry")
                            .with_details(format!("path={path}; err={e}")),
                    });
                }
            }
        }
        found.sort();
        out.extend(found);
    }
    out
}
