use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::TocArgs;
use crate::error::PrepError;
use crate::extract::{DocumentKind, read_outline};
use crate::model::{TocEntry, TocListingEntry};
use crate::toc::toc_chapter_number;
use crate::util::emit_text;

pub fn run(args: TocArgs) -> Result<()> {
    if !args.path.is_file() {
        return Err(PrepError::FileNotFound(args.path.clone()).into());
    }

    let kind = DocumentKind::from_path(&args.path)?;
    if kind != DocumentKind::Pdf {
        bail!(
            "{} is a {} document; only PDFs carry an outline",
            args.path.display(),
            kind.as_str()
        );
    }

    let entries = read_outline(&args.path)
        .with_context(|| format!("failed to read outline of {}", args.path.display()))?;
    if entries.is_empty() {
        warn!(path = %args.path.display(), "PDF has no outline");
    }

    let listing = listing(entries);
    info!(
        path = %args.path.display(),
        entries = listing.len(),
        chapters = listing.iter().filter(|entry| entry.chapter_number.is_some()).count(),
        "read table of contents"
    );

    let json = serde_json::to_string_pretty(&listing).context("failed to serialize outline")?;
    emit_text(args.output.as_deref(), &json)
}

/// Only level-1 entries are numbered, matching what chapter lookup uses.
fn listing(entries: Vec<TocEntry>) -> Vec<TocListingEntry> {
    entries
        .into_iter()
        .map(|entry| TocListingEntry {
            chapter_number: if entry.level == 1 {
                toc_chapter_number(&entry.title)
            } else {
                None
            },
            level: entry.level,
            title: entry.title,
            page: entry.page,
        })
        .collect()
}
