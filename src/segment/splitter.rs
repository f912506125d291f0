use std::ops::Range;

use tracing::debug;

use super::patterns::HeadingMatcher;
use crate::error::{PrepError, Result};
use crate::model::{Chapter, HeadingCandidate};

pub const MIN_SEGMENT_CHARS: usize = 200;

pub const WHOLE_DOCUMENT_TITLE: &str = "全文";

#[derive(Debug)]
pub struct Segmenter {
    matcher: HeadingMatcher,
    min_segment_chars: usize,
}

impl Segmenter {
    pub fn new() -> Result<Self> {
        Ok(Self::with_matcher(HeadingMatcher::new()?, MIN_SEGMENT_CHARS))
    }

    pub fn with_matcher(matcher: HeadingMatcher, min_segment_chars: usize) -> Self {
        Self {
            matcher,
            min_segment_chars,
        }
    }

    pub fn split(&self, text: &str) -> Result<Vec<Chapter>> {
        let candidates = self.matcher.collect_candidates(text);
        self.split_at(text, &candidates)
    }

    /// Candidates may come in any order; offsets past the end of `text` or
    /// inside a multi-byte char are ignored.
    pub fn split_at(&self, text: &str, candidates: &[HeadingCandidate]) -> Result<Vec<Chapter>> {
        if text.trim().is_empty() {
            return Err(PrepError::EmptyDocumentText);
        }

        let candidates = ordered_candidates(text, candidates);
        let candidates = candidates.as_slice();

        if candidates.is_empty() {
            debug!("no heading candidates, using whole document");
            return Ok(vec![whole_document(text)]);
        }

        let spans = segment_spans(text.len(), candidates);
        let mut chapters = Vec::<Chapter>::new();

        for (candidate, span) in candidates.iter().zip(spans) {
            let segment = text[span.clone()].trim();
            if segment.is_empty() {
                continue;
            }

            let segment_chars = segment.chars().count();
            if segment_chars < self.min_segment_chars && candidates.len() > 1 {
                debug!(
                    title = %candidate.title,
                    chars = segment_chars,
                    "discarding short segment"
                );
                continue;
            }

            let score = candidate.weight + segment_chars as f64 / 1000.0;
            debug!(
                title = %candidate.title,
                chars = segment_chars,
                score,
                "retained segment"
            );

            chapters.push(Chapter {
                id: chapters.len() + 1,
                title: candidate.title.clone(),
                text: segment.to_string(),
                span,
            });
        }

        if chapters.is_empty() {
            debug!(
                candidates = candidates.len(),
                "every segment was discarded, using whole document"
            );
            return Ok(vec![whole_document(text)]);
        }

        Ok(chapters)
    }
}

fn ordered_candidates(text: &str, candidates: &[HeadingCandidate]) -> Vec<HeadingCandidate> {
    let mut ordered = candidates
        .iter()
        .filter(|candidate| text.is_char_boundary(candidate.offset))
        .cloned()
        .collect::<Vec<HeadingCandidate>>();

    ordered.sort_by_key(|candidate| candidate.offset);
    ordered.dedup_by_key(|candidate| candidate.offset);
    ordered
}

pub fn split_into_chapters(text: &str) -> Result<Vec<Chapter>> {
    Segmenter::new()?.split(text)
}

/// Tiles `0..text_len`: each span ends where the next candidate begins, and
/// the first span also absorbs any text ahead of the first heading.
pub fn segment_spans(text_len: usize, candidates: &[HeadingCandidate]) -> Vec<Range<usize>> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let start = if index == 0 {
                0
            } else {
                candidates[index].offset
            };
            let end = candidates
                .get(index + 1)
                .map(|next| next.offset)
                .unwrap_or(text_len);
            start..end
        })
        .collect()
}

fn whole_document(text: &str) -> Chapter {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();

    Chapter {
        id: 1,
        title: WHOLE_DOCUMENT_TITLE.to_string(),
        text: text[start..end].to_string(),
        span: start..end,
    }
}
