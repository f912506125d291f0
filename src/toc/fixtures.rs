use super::PagedDocument;
use crate::model::TocEntry;

/// In-memory stand-in for a parsed PDF.
#[derive(Debug, Default)]
pub(crate) struct MemoryDocument {
    pub pages: Vec<String>,
    pub toc: Vec<TocEntry>,
}

impl MemoryDocument {
    /// Pages read "page 1", "page 2", ... so ranges are easy to assert.
    pub fn numbered(page_count: usize, toc: Vec<TocEntry>) -> Self {
        Self {
            pages: (1..=page_count).map(|page| format!("page {page}\n")).collect(),
            toc,
        }
    }
}

impl PagedDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    fn toc(&self) -> &[TocEntry] {
        &self.toc
    }
}

pub(crate) fn entry(level: u32, title: &str, page: u32) -> TocEntry {
    TocEntry {
        level,
        title: title.to_string(),
        page,
    }
}
