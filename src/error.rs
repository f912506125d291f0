use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to extract text from {}: {reason}", .path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    #[error("all OCR backends unavailable: {}", .attempts.join("; "))]
    AllOcrBackendsUnavailable { attempts: Vec<String> },

    #[error("chapter {requested} not found: {reason}")]
    ChapterNotFound { requested: u32, reason: String },

    #[error(
        "chapter {requested} not found by table of contents ({toc}) or heading scan ({headings})"
    )]
    ChapterLookupFailed {
        requested: u32,
        toc: Box<PrepError>,
        headings: Box<PrepError>,
    },

    #[error("invalid chapter identifier: {0:?}")]
    InvalidChapterIdentifier(String),

    #[error("document text is empty after extraction")]
    EmptyDocumentText,

    #[error("failed to compile heading pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrepError {
    pub fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ExtractionFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn chapter_not_found(requested: u32, reason: impl Into<String>) -> Self {
        Self::ChapterNotFound {
            requested,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
