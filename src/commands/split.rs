use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clean::clean_text;
use crate::cli::SplitArgs;
use crate::error::PrepError;
use crate::extract::Extractor;
use crate::model::Chapter;
use crate::segment::split_into_chapters;
use crate::toc::{PagedDocument, split_by_toc};
use crate::util::emit_text;

pub fn run(args: SplitArgs) -> Result<()> {
    let extractor = Extractor::from_config(args.ocr.to_config());
    let document = extractor
        .load_document(&args.path)
        .with_context(|| format!("failed to extract text from {}", args.path.display()))?;

    let mut chapters = document_chapters(&*document)
        .with_context(|| format!("failed to split {}", args.path.display()))?;

    if args.clean {
        chapters = clean_chapters(chapters)
            .with_context(|| format!("failed to clean chapters of {}", args.path.display()))?;
    }

    info!(
        path = %args.path.display(),
        chapters = chapters.len(),
        cleaned = args.clean,
        "split document into chapters"
    );

    let json = serde_json::to_string_pretty(&chapters).context("failed to serialize chapters")?;
    emit_text(args.output.as_deref(), &json)
}

/// Outline chapters when the document has any, heading segmentation otherwise.
fn document_chapters(doc: &dyn PagedDocument) -> crate::error::Result<Vec<Chapter>> {
    let chapters = split_by_toc(doc);
    if !chapters.is_empty() {
        return Ok(chapters);
    }

    if !doc.toc().is_empty() {
        info!(
            toc_entries = doc.toc().len(),
            "table of contents has no chapter entries; scanning headings"
        );
    }
    split_into_chapters(&doc.full_text())
}

/// Cleans every chapter, dropping those left without text and renumbering
/// the rest.
fn clean_chapters(chapters: Vec<Chapter>) -> crate::error::Result<Vec<Chapter>> {
    let mut cleaned = Vec::<Chapter>::with_capacity(chapters.len());

    for mut chapter in chapters {
        chapter.text = clean_text(&chapter.text);
        if chapter.text.is_empty() {
            warn!(title = %chapter.title, "dropping chapter with no text left after cleaning");
            continue;
        }
        chapter.id = cleaned.len() + 1;
        cleaned.push(chapter);
    }

    if cleaned.is_empty() {
        return Err(PrepError::EmptyDocumentText);
    }
    Ok(cleaned)
}
