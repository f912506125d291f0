use tracing::{debug, info};

use super::numbering::toc_chapter_number;
use crate::error::{PrepError, Result};
use crate::model::{Chapter, PageRange, TocEntry};

/// A page-addressable document that may carry a native outline.
pub trait PagedDocument {
    fn page_count(&self) -> usize;

    /// `index` is 0-based.
    fn page_text(&self, index: usize) -> Option<&str>;

    fn toc(&self) -> &[TocEntry];

    /// All pages in order, each terminated by a newline.
    fn full_text(&self) -> String {
        let mut text = String::new();
        for index in 0..self.page_count() {
            if let Some(page_text) = self.page_text(index) {
                push_page(&mut text, page_text);
            }
        }
        text
    }
}

fn push_page(text: &mut String, page_text: &str) {
    text.push_str(page_text);
    if !page_text.ends_with('\n') {
        text.push('\n');
    }
}

#[derive(Debug, Clone)]
pub struct TocChapter {
    pub number: u32,
    pub title: String,
    pub pages: PageRange,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ChapterEntry<'a> {
    pub number: u32,
    pub entry: &'a TocEntry,
}

/// Level-1 entries carrying a chapter marker, ordered by page.
pub fn chapter_entries(toc: &[TocEntry]) -> Vec<ChapterEntry<'_>> {
    let mut entries = toc
        .iter()
        .filter(|entry| entry.level == 1)
        .filter_map(|entry| {
            toc_chapter_number(&entry.title).map(|number| ChapterEntry { number, entry })
        })
        .collect::<Vec<ChapterEntry<'_>>>();

    entries.sort_by_key(|chapter| chapter.entry.page);
    entries
}

pub fn locate_by_toc<D: PagedDocument + ?Sized>(doc: &D, requested: u32) -> Result<TocChapter> {
    if doc.toc().is_empty() {
        return Err(PrepError::chapter_not_found(
            requested,
            "document has no table of contents",
        ));
    }

    let entries = chapter_entries(doc.toc());
    debug!(
        toc_entries = doc.toc().len(),
        chapter_entries = entries.len(),
        "filtered table of contents"
    );

    let Some(position) = entries.iter().position(|chapter| chapter.number == requested) else {
        return Err(PrepError::chapter_not_found(
            requested,
            format!(
                "no level-1 table of contents entry among {} chapter entries",
                entries.len()
            ),
        ));
    };

    let page_count = document_pages(doc);
    let Some(pages) = chapter_range(&entries, position, page_count) else {
        return Err(PrepError::chapter_not_found(
            requested,
            format!(
                "table of contents points at page {} of a {}-page document",
                entries[position].entry.page, page_count
            ),
        ));
    };
    let found = entries[position];
    let text = range_text(doc, pages);

    if text.trim().is_empty() {
        return Err(PrepError::chapter_not_found(
            requested,
            format!("pages {}-{} contain no text", pages.start, pages.end),
        ));
    }

    info!(
        chapter = requested,
        title = %found.entry.title,
        page_start = pages.start,
        page_end = pages.end,
        pages = pages.page_count(),
        "located chapter via table of contents"
    );

    Ok(TocChapter {
        number: requested,
        title: found.entry.title.clone(),
        pages,
        text,
    })
}

/// Cuts the whole document at its level-1 chapter entries. Empty when the
/// outline has no usable chapter entry.
pub fn split_by_toc<D: PagedDocument + ?Sized>(doc: &D) -> Vec<Chapter> {
    let entries = chapter_entries(doc.toc());
    let page_count = document_pages(doc);
    let page_starts = page_offsets(doc);
    let mut chapters = Vec::<Chapter>::new();

    for (position, chapter) in entries.iter().enumerate() {
        let entry = chapter.entry;
        let Some(pages) = chapter_range(&entries, position, page_count) else {
            debug!(title = %entry.title, page = entry.page, "skipping out-of-range entry");
            continue;
        };

        let text = range_text(doc, pages);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(title = %entry.title, "skipping chapter without text");
            continue;
        }

        let start = page_starts[pages.start as usize - 1];
        chapters.push(Chapter {
            id: chapters.len() + 1,
            title: entry.title.clone(),
            text: trimmed.to_string(),
            span: start..start + text.len(),
        });
    }

    info!(
        chapter_entries = entries.len(),
        chapters = chapters.len(),
        "split document by table of contents"
    );
    chapters
}

fn document_pages<D: PagedDocument + ?Sized>(doc: &D) -> u32 {
    u32::try_from(doc.page_count()).unwrap_or(u32::MAX)
}

/// Inclusive pages of `entries[position]`: up to the page before the next
/// chapter entry, or the last page. `None` when the entry points outside the
/// document.
fn chapter_range(
    entries: &[ChapterEntry<'_>],
    position: usize,
    page_count: u32,
) -> Option<PageRange> {
    let start = entries[position].entry.page;
    if start == 0 || start > page_count {
        return None;
    }

    let end = entries
        .get(position + 1)
        .map(|next| next.entry.page.saturating_sub(1))
        .unwrap_or(page_count)
        .clamp(start, page_count);
    Some(PageRange { start, end })
}

fn range_text<D: PagedDocument + ?Sized>(doc: &D, pages: PageRange) -> String {
    let mut text = String::new();
    for index in (pages.start - 1)..pages.end {
        if let Some(page_text) = doc.page_text(index as usize) {
            push_page(&mut text, page_text);
        }
    }
    text
}

/// Byte offset of each page within `full_text`, plus the end offset.
fn page_offsets<D: PagedDocument + ?Sized>(doc: &D) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(doc.page_count() + 1);
    let mut offset = 0;
    for index in 0..doc.page_count() {
        offsets.push(offset);
        if let Some(page_text) = doc.page_text(index) {
            offset += page_text.len() + usize::from(!page_text.ends_with('\n'));
        }
    }
    offsets.push(offset);
    offsets
}
