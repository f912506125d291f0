use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A line suspected to open a chapter, with the weight of the rule that matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    /// Byte offset of the heading line in the scanned text.
    pub offset: usize,
    pub title: String,
    pub weight: f64,
}

/// One segment of a document, numbered 1..N in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub id: usize,
    pub title: String,
    pub text: String,
    #[serde(skip)]
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
}

/// Inclusive, 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn page_count(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TocListingEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
    pub chapter_number: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPath {
    Toc,
    HeadingScan,
}

impl LookupPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toc => "toc",
            Self::HeadingScan => "heading_scan",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterRunEntry {
    pub requested: String,
    pub chapter_number: Option<u32>,
    pub status: String,
    pub lookup: Option<LookupPath>,
    pub title: Option<String>,
    pub pages: Option<PageRange>,
    pub raw_char_count: usize,
    pub clean_char_count: usize,
    pub output_path: Option<String>,
    pub toc_error: Option<String>,
    pub heading_error: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub document_kind: String,
    pub command: String,
    pub chapters: Vec<ChapterRunEntry>,
    pub warnings: Vec<String>,
}
