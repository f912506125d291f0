use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::clean::clean_text;
use crate::cli::ChapterArgs;
use crate::error::PrepError;
use crate::extract::{DocumentKind, Extractor};
use crate::lookup::locate_chapter;
use crate::model::{ChapterRunEntry, ChapterRunManifest};
use crate::segment::Segmenter;
use crate::toc::{PagedDocument, parse_chapter_identifier};
use crate::util::{
    char_count, clip_chars, ensure_directory, now_utc_string, sha256_file, utc_compact_string,
    write_json_pretty, write_text,
};

const MANIFEST_VERSION: u32 = 1;

const STATUS_WRITTEN: &str = "written";
const STATUS_SKIPPED: &str = "skipped_existing";
const STATUS_NOT_FOUND: &str = "not_found";
const STATUS_EMPTY: &str = "empty_text";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChapterRequest {
    raw: String,
    number: u32,
}

#[derive(Debug, Clone, Copy)]
struct WriteOptions {
    raw: bool,
    max_chars: Option<usize>,
}

pub fn run(args: ChapterArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let requests = parse_requests(&args.chapters)?;

    if !args.path.is_file() {
        return Err(PrepError::FileNotFound(args.path.clone()).into());
    }
    let kind = DocumentKind::from_path(&args.path)?;

    ensure_directory(&args.output_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir.join(format!(
            "chapter_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    let options = WriteOptions {
        raw: args.raw,
        max_chars: args.max_chars,
    };

    let mut manifest = ChapterRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        started_at: started_at.clone(),
        updated_at: started_at,
        source_path: args.path.display().to_string(),
        source_sha256: sha256_file(&args.path)?,
        document_kind: kind.as_str().to_string(),
        command: "chapter".to_string(),
        chapters: Vec::with_capacity(requests.len()),
        warnings: Vec::new(),
    };

    let plans = requests
        .into_iter()
        .map(|request| {
            let output_path = chapter_output_path(&args.output_dir, request.number, options);
            let skip = args.skip_existing && output_path.exists();
            (request, output_path, skip)
        })
        .collect::<Vec<(ChapterRequest, PathBuf, bool)>>();

    let document = if plans.iter().any(|(_, _, skip)| !skip) {
        let extractor = Extractor::from_config(args.ocr.to_config());
        let document = extractor
            .load_document(&args.path)
            .with_context(|| format!("failed to load {}", args.path.display()))?;
        Some(document)
    } else {
        info!("every requested chapter already has output; nothing to extract");
        None
    };
    let segmenter = Segmenter::new().context("failed to compile heading rules")?;

    for (request, output_path, skip) in &plans {
        let entry = match document.as_deref() {
            Some(doc) if !skip => write_chapter(
                doc,
                &segmenter,
                request,
                output_path,
                options,
                &mut manifest.warnings,
            )?,
            _ => {
                info!(
                    chapter = request.number,
                    path = %output_path.display(),
                    "skipping chapter with existing output"
                );
                ChapterRunEntry {
                    status: STATUS_SKIPPED.to_string(),
                    output_path: Some(output_path.display().to_string()),
                    ..base_entry(request)
                }
            }
        };
        manifest.chapters.push(entry);
    }

    manifest.updated_at = now_utc_string();
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote chapter run manifest");

    let failed = manifest
        .chapters
        .iter()
        .filter(|entry| entry.status == STATUS_NOT_FOUND || entry.status == STATUS_EMPTY)
        .count();
    if failed > 0 {
        bail!(
            "{} of {} requested chapters could not be written; see {}",
            failed,
            manifest.chapters.len(),
            manifest_path.display()
        );
    }

    info!(chapters = manifest.chapters.len(), "chapter run completed");
    Ok(())
}

fn parse_requests(raw: &[String]) -> Result<Vec<ChapterRequest>> {
    let mut seen = HashSet::<u32>::new();
    let mut requests = Vec::with_capacity(raw.len());

    for item in raw.iter().map(|item| item.trim()).filter(|item| !item.is_empty()) {
        let number = parse_chapter_identifier(item)?;
        if !seen.insert(number) {
            warn!(chapter = number, requested = item, "ignoring duplicate chapter request");
            continue;
        }
        requests.push(ChapterRequest {
            raw: item.to_string(),
            number,
        });
    }

    if requests.is_empty() {
        bail!("no chapters requested");
    }

    Ok(requests)
}

fn chapter_output_path(output_dir: &Path, number: u32, options: WriteOptions) -> PathBuf {
    let suffix = if options.raw { "raw" } else { "clean" };
    output_dir.join(format!("ch{}_{}.txt", number, suffix))
}

fn base_entry(request: &ChapterRequest) -> ChapterRunEntry {
    ChapterRunEntry {
        requested: request.raw.clone(),
        chapter_number: Some(request.number),
        status: String::new(),
        lookup: None,
        title: None,
        pages: None,
        raw_char_count: 0,
        clean_char_count: 0,
        output_path: None,
        toc_error: None,
        heading_error: None,
        error: None,
    }
}

/// Lookup failures and chapters without usable text are recorded on the
/// entry; only write failures abort.
fn write_chapter(
    doc: &dyn PagedDocument,
    segmenter: &Segmenter,
    request: &ChapterRequest,
    output_path: &Path,
    options: WriteOptions,
    warnings: &mut Vec<String>,
) -> Result<ChapterRunEntry> {
    let located = match locate_chapter(doc, segmenter, request.number) {
        Ok(located) => located,
        Err(err) => {
            warn!(chapter = request.number, error = %err, "chapter not found");
            warnings.push(err.to_string());

            let (toc_error, heading_error) = match err {
                PrepError::ChapterLookupFailed { toc, headings, .. } => {
                    (Some(toc.to_string()), Some(headings.to_string()))
                }
                other => (None, Some(other.to_string())),
            };
            return Ok(ChapterRunEntry {
                status: STATUS_NOT_FOUND.to_string(),
                toc_error,
                heading_error,
                ..base_entry(request)
            });
        }
    };

    let prepared = if options.raw {
        located.text.clone()
    } else {
        clean_text(&located.text)
    };
    if prepared.trim().is_empty() {
        let err = PrepError::EmptyDocumentText;
        warn!(
            chapter = request.number,
            title = %located.title,
            "chapter has no text left to write"
        );
        warnings.push(format!("chapter {}: {}", request.number, err));

        return Ok(ChapterRunEntry {
            status: STATUS_EMPTY.to_string(),
            lookup: Some(located.lookup),
            title: Some(located.title.clone()),
            pages: located.pages,
            raw_char_count: char_count(&located.text),
            error: Some(err.to_string()),
            ..base_entry(request)
        });
    }
    let output = match options.max_chars {
        Some(max_chars) => clip_chars(&prepared, max_chars),
        None => prepared.as_str(),
    };
    if output.len() < prepared.len() {
        warnings.push(format!(
            "chapter {} clipped from {} to {} chars",
            request.number,
            char_count(&prepared),
            char_count(output)
        ));
    }

    write_text(output_path, output)?;
    info!(
        chapter = located.number,
        lookup = located.lookup.as_str(),
        title = %located.title,
        chars = char_count(output),
        path = %output_path.display(),
        "wrote chapter"
    );

    Ok(ChapterRunEntry {
        status: STATUS_WRITTEN.to_string(),
        lookup: Some(located.lookup),
        title: Some(located.title.clone()),
        pages: located.pages,
        raw_char_count: char_count(&located.text),
        clean_char_count: char_count(output),
        output_path: Some(output_path.display().to_string()),
        ..base_entry(request)
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::model::{LookupPath, PageRange};
    use crate::toc::fixtures::{MemoryDocument, entry};

    fn request(raw: &str, number: u32) -> ChapterRequest {
        ChapterRequest {
            raw: raw.to_string(),
            number,
        }
    }

    fn book() -> MemoryDocument {
        let mut doc = MemoryDocument::numbered(
            6,
            vec![entry(1, "第1章 绪论", 1), entry(1, "第2章 线性表", 4)],
        );
        doc.pages[3] = "第2章\u{3000}线性表\n线性表是具有相同数据类型的\n数据元素的有限序列。\n42\n".to_string();
        doc
    }

    #[test]
    fn requests_are_parsed_and_deduplicated() {
        let raw = ["2", " 第二章 ", "第十二章", ""].map(str::to_string);

        let requests = parse_requests(&raw).expect("valid identifiers");

        assert_eq!(requests, vec![request("2", 2), request("第十二章", 12)]);
    }

    #[test]
    fn invalid_or_empty_requests_are_rejected() {
        assert!(parse_requests(&["绪论".to_string()]).is_err());
        assert!(parse_requests(&[" ".to_string()]).is_err());
    }

    #[test]
    fn output_name_reflects_cleaning() {
        let dir = Path::new("out");
        let clean = WriteOptions {
            raw: false,
            max_chars: None,
        };
        let raw = WriteOptions {
            raw: true,
            max_chars: None,
        };

        assert_eq!(chapter_output_path(dir, 3, clean), dir.join("ch3_clean.txt"));
        assert_eq!(chapter_output_path(dir, 3, raw), dir.join("ch3_raw.txt"));
    }

    #[test]
    fn located_chapter_is_cleaned_and_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ch2_clean.txt");
        let segmenter = Segmenter::new().expect("default rules compile");
        let mut warnings = Vec::new();
        let options = WriteOptions {
            raw: false,
            max_chars: None,
        };

        let entry = write_chapter(
            &book(),
            &segmenter,
            &request("2", 2),
            &path,
            options,
            &mut warnings,
        )
        .expect("write succeeds");

        assert_eq!(entry.status, STATUS_WRITTEN);
        assert_eq!(entry.lookup, Some(LookupPath::Toc));
        assert_eq!(entry.pages, Some(PageRange { start: 4, end: 6 }));
        let written = fs::read_to_string(&path).expect("read back");
        assert!(written.starts_with("第2章 线性表 线性表是具有相同数据类型的 数据元素的有限序列。\n"));
        assert!(!written.contains("\n42\n"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn max_chars_clips_and_warns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ch2_raw.txt");
        let segmenter = Segmenter::new().expect("default rules compile");
        let mut warnings = Vec::new();
        let options = WriteOptions {
            raw: true,
            max_chars: Some(3),
        };

        let entry = write_chapter(
            &book(),
            &segmenter,
            &request("2", 2),
            &path,
            options,
            &mut warnings,
        )
        .expect("write succeeds");

        assert_eq!(entry.clean_char_count, 3);
        assert!(entry.raw_char_count > 3);
        assert_eq!(fs::read_to_string(&path).expect("read back"), "第2章\n");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn chapter_cleaned_to_nothing_is_not_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ch2_clean.txt");
        let segmenter = Segmenter::new().expect("default rules compile");
        let mut warnings = Vec::new();
        let options = WriteOptions {
            raw: false,
            max_chars: None,
        };
        let mut doc = MemoryDocument::numbered(
            2,
            vec![entry(1, "第1章 绪论", 1), entry(1, "第2章 线性表", 2)],
        );
        doc.pages[1] = "17\n".to_string();

        let entry = write_chapter(
            &doc,
            &segmenter,
            &request("2", 2),
            &path,
            options,
            &mut warnings,
        )
        .expect("empty chapter is not an error");

        assert_eq!(entry.status, STATUS_EMPTY);
        assert_eq!(entry.clean_char_count, 0);
        assert_eq!(entry.raw_char_count, 3);
        assert_eq!(
            entry.error.as_deref(),
            Some(PrepError::EmptyDocumentText.to_string().as_str())
        );
        assert!(entry.output_path.is_none());
        assert!(!path.exists());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unknown_chapter_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ch9_clean.txt");
        let segmenter = Segmenter::new().expect("default rules compile");
        let mut warnings = Vec::new();
        let options = WriteOptions {
            raw: false,
            max_chars: None,
        };

        let entry = write_chapter(
            &book(),
            &segmenter,
            &request("9", 9),
            &path,
            options,
            &mut warnings,
        )
        .expect("lookup failure is not an error");

        assert_eq!(entry.status, STATUS_NOT_FOUND);
        assert!(entry.toc_error.is_some());
        assert!(entry.heading_error.is_some());
        assert!(entry.output_path.is_none());
        assert!(!path.exists());
        assert_eq!(warnings.len(), 1);
    }
}
