use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::Extractor;
use crate::config::{ExtractConfig, OcrPolicy};
use crate::error::{PrepError, Result};
use crate::model::TocEntry;
use crate::toc::{PagedDocument, parse_outline_xml};

/// Page texts of a PDF plus its native outline, when it has one.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<String>,
    toc: Vec<TocEntry>,
}

impl PdfDocument {
    pub fn open(path: &Path, extractor: &Extractor) -> Result<Self> {
        let mut document = Self::read_pages(path, extractor)?;
        document.toc = match read_outline(path) {
            Ok(toc) => toc,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read PDF outline");
                Vec::new()
            }
        };
        info!(
            path = %path.display(),
            pages = document.pages.len(),
            toc_entries = document.toc.len(),
            "opened PDF"
        );
        Ok(document)
    }

    /// Pages only. The text layer is used unless the OCR policy says otherwise.
    pub fn read_pages(path: &Path, extractor: &Extractor) -> Result<Self> {
        let config = extractor.config();

        let pages = if config.ocr_policy == OcrPolicy::Force {
            ocr_pages(path, extractor)?
        } else {
            let pages = text_layer_pages(path)?;
            let chars = text_layer_chars(&pages);

            if needs_ocr(&pages, config) {
                info!(
                    path = %path.display(),
                    chars,
                    min_text_chars = config.min_text_chars,
                    "PDF text layer below threshold; falling back to OCR"
                );
                ocr_pages(path, extractor)?
            } else {
                if chars < config.min_text_chars {
                    warn!(
                        path = %path.display(),
                        chars,
                        min_text_chars = config.min_text_chars,
                        "PDF text layer is nearly empty and OCR is off"
                    );
                }
                pages
            }
        };

        Ok(Self {
            pages,
            toc: Vec::new(),
        })
    }
}

impl PagedDocument for PdfDocument {
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

/// Whether `pages` from the text layer should be replaced by OCR output.
pub(super) fn needs_ocr(pages: &[String], config: &ExtractConfig) -> bool {
    match config.ocr_policy {
        OcrPolicy::Force => true,
        OcrPolicy::Off => false,
        OcrPolicy::Auto => text_layer_chars(pages) < config.min_text_chars,
    }
}

fn text_layer_chars(pages: &[String]) -> usize {
    pages.iter().map(|page| page.trim().chars().count()).sum()
}

fn run_tool(program: &str, command: &mut Command, path: &Path) -> Result<Vec<u8>> {
    let output = command.output().map_err(|err| {
        PrepError::extraction(path, format!("failed to execute {}: {}", program, err))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PrepError::extraction(
            path,
            format!("{} returned non-zero exit status: {}", program, stderr.trim()),
        ));
    }

    Ok(output.stdout)
}

fn text_layer_pages(path: &Path) -> Result<Vec<String>> {
    let stdout = run_tool(
        "pdftotext",
        Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-"),
        path,
    )?;

    Ok(split_form_feed_pages(&String::from_utf8_lossy(&stdout)))
}

/// pdftotext ends every page with a form feed, so the final empty chunk is
/// not a page.
pub(super) fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    if pages.last().is_some_and(|last| last.is_empty()) {
        pages.pop();
    }

    pages
}

/// Native outline via `pdftohtml -xml`, empty when the PDF has none.
pub fn read_outline(path: &Path) -> Result<Vec<TocEntry>> {
    let stdout = run_tool(
        "pdftohtml",
        Command::new("pdftohtml")
            .arg("-xml")
            .arg("-i")
            .arg("-q")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg("1")
            .arg("-stdout")
            .arg(path),
        path,
    )?;

    Ok(parse_outline_xml(&String::from_utf8_lossy(&stdout)))
}

/// Rasterizes every page into a scoped temp directory and OCRs them in order.
fn ocr_pages(path: &Path, extractor: &Extractor) -> Result<Vec<String>> {
    let workdir = tempfile::Builder::new()
        .prefix("quizprep_pages_")
        .tempdir()
        .map_err(|err| {
            PrepError::extraction(path, format!("failed to create temp dir: {}", err))
        })?;
    let prefix = workdir.path().join("page");

    run_tool(
        "pdftoppm",
        Command::new("pdftoppm")
            .arg("-r")
            .arg(extractor.config().ocr_dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&prefix),
        path,
    )?;

    let images = rendered_page_images(workdir.path())?;
    if images.is_empty() {
        return Err(PrepError::extraction(path, "pdftoppm produced no page images"));
    }

    info!(
        path = %path.display(),
        pages = images.len(),
        dpi = extractor.config().ocr_dpi,
        backends = ?extractor.ocr().backend_names(),
        "running OCR over rendered pages"
    );

    let mut pages = Vec::with_capacity(images.len());
    for image in &images {
        let bytes = fs::read(image).map_err(|err| PrepError::extraction(image, err))?;
        pages.push(extractor.ocr().recognize(&bytes)?);
    }

    Ok(pages)
}

/// pdftoppm zero-pads page numbers, so name order is page order.
pub(super) fn rendered_page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()?;

    images.retain(|image| {
        image
            .extension()
            .and_then(|value| value.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    });
    images.sort();

    Ok(images)
}
