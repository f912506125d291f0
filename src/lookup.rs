//! Chapter lookup: the native table of contents first, heading scan second.

use tracing::{debug, info};

use crate::error::{PrepError, Result};
use crate::model::{Chapter, LookupPath, PageRange};
use crate::segment::Segmenter;
use crate::toc::{PagedDocument, locate_by_toc, parse_chapter_number, toc_chapter_number};

#[derive(Debug, Clone)]
pub struct LocatedChapter {
    pub number: u32,
    pub title: String,
    pub text: String,
    /// Only known when the table of contents located the chapter.
    pub pages: Option<PageRange>,
    pub lookup: LookupPath,
}

pub fn locate_chapter<D: PagedDocument + ?Sized>(
    doc: &D,
    segmenter: &Segmenter,
    requested: u32,
) -> Result<LocatedChapter> {
    let toc_error = match locate_by_toc(doc, requested) {
        Ok(found) => {
            return Ok(LocatedChapter {
                number: found.number,
                title: found.title,
                text: found.text,
                pages: Some(found.pages),
                lookup: LookupPath::Toc,
            });
        }
        Err(err) => err,
    };
    debug!(chapter = requested, reason = %toc_error, "falling back to heading scan");

    locate_by_headings(&doc.full_text(), segmenter, requested).map_err(|heading_error| {
        PrepError::ChapterLookupFailed {
            requested,
            toc: Box::new(toc_error),
            headings: Box::new(heading_error),
        }
    })
}

/// Segments `text` and picks the first segment titled with `requested`.
/// Titles carrying an explicit chapter marker win over bare numbers such as
/// `2.1 ...` section headings.
pub fn locate_by_headings(
    text: &str,
    segmenter: &Segmenter,
    requested: u32,
) -> Result<LocatedChapter> {
    let chapters = segmenter.split(text)?;

    let found = find_marked(&chapters, requested)
        .or_else(|| {
            chapters
                .iter()
                .find(|chapter| parse_chapter_number(&chapter.title) == Some(requested))
        })
        .ok_or_else(|| {
            PrepError::chapter_not_found(
                requested,
                format!("no heading among {} segments", chapters.len()),
            )
        })?;

    info!(
        chapter = requested,
        title = %found.title,
        segment = found.id,
        offset = found.span.start,
        "located chapter via heading scan"
    );

    Ok(LocatedChapter {
        number: requested,
        title: found.title.clone(),
        text: found.text.clone(),
        pages: None,
        lookup: LookupPath::HeadingScan,
    })
}

fn find_marked(chapters: &[Chapter], requested: u32) -> Option<&Chapter> {
    chapters
        .iter()
        .find(|chapter| toc_chapter_number(&chapter.title) == Some(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::fixtures::{MemoryDocument, entry};

    fn body(label: &str) -> String {
        format!("{label}的正文内容。").repeat(30)
    }

    fn scanned_book() -> String {
        format!(
            "第1章 绪论\n{}\n1.1 基本概念\n{}\n第2章 线性表\n{}\n第3章 栈和队列\n{}\n",
            body("绪论"),
            body("概念"),
            body("线性表"),
            body("栈")
        )
    }

    #[test]
    fn table_of_contents_is_preferred() {
        let doc = MemoryDocument::numbered(
            40,
            vec![entry(1, "第1章 绪论", 1), entry(1, "第2章 线性表", 15)],
        );
        let segmenter = Segmenter::new().expect("default rules compile");

        let located = locate_chapter(&doc, &segmenter, 2).expect("toc has chapter 2");

        assert_eq!(located.lookup, LookupPath::Toc);
        assert_eq!(located.pages, Some(PageRange { start: 15, end: 40 }));
        assert_eq!(located.title, "第2章 线性表");
    }

    #[test]
    fn heading_scan_covers_documents_without_outline() {
        let doc = MemoryDocument {
            pages: vec![scanned_book()],
            toc: Vec::new(),
        };
        let segmenter = Segmenter::new().expect("default rules compile");

        let located = locate_chapter(&doc, &segmenter, 2).expect("heading exists");

        assert_eq!(located.lookup, LookupPath::HeadingScan);
        assert_eq!(located.title, "第2章 线性表");
        assert!(located.pages.is_none());
        assert!(located.text.starts_with("第2章 线性表\n线性表的正文内容。"));
        assert!(!located.text.contains("第3章"));
    }

    #[test]
    fn chapter_marker_beats_section_number() {
        let segmenter = Segmenter::new().expect("default rules compile");

        let located = locate_by_headings(&scanned_book(), &segmenter, 1).expect("chapter 1");

        assert_eq!(located.title, "第1章 绪论");
    }

    #[test]
    fn both_paths_failing_reports_both_reasons() {
        let doc = MemoryDocument {
            pages: vec![scanned_book()],
            toc: vec![entry(1, "第1章 绪论", 1)],
        };
        let segmenter = Segmenter::new().expect("default rules compile");

        let error = locate_chapter(&doc, &segmenter, 7).expect_err("no chapter 7");

        match error {
            PrepError::ChapterLookupFailed {
                requested,
                toc,
                headings,
            } => {
                assert_eq!(requested, 7);
                assert!(matches!(*toc, PrepError::ChapterNotFound { .. }));
                assert!(matches!(*headings, PrepError::ChapterNotFound { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_document_fails_heading_scan_with_empty_text() {
        let doc = MemoryDocument {
            pages: vec!["   \n".to_string()],
            toc: Vec::new(),
        };
        let segmenter = Segmenter::new().expect("default rules compile");

        let error = locate_chapter(&doc, &segmenter, 1).expect_err("blank document");

        assert!(matches!(
            error,
            PrepError::ChapterLookupFailed { ref headings, .. }
                if matches!(**headings, PrepError::EmptyDocumentText)
        ));
    }
}
