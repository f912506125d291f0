//! File-type dispatch from an input path to plain text.

mod office;
mod pdf;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ExtractConfig;
use crate::error::{PrepError, Result};
use crate::model::TocEntry;
use crate::ocr::OcrChain;
use crate::toc::PagedDocument;

pub use office::{docx_text, pptx_text};
pub use pdf::{PdfDocument, read_outline};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Pptx,
    Image,
}

impl DocumentKind {
    /// Classifies by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Ok(Self::Image),
            "" => Err(PrepError::UnsupportedFileType(format!(
                "{} has no extension",
                path.display()
            ))),
            other => Err(PrepError::UnsupportedFileType(format!(".{}", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Image => "image",
        }
    }
}

/// Text of a document without page structure, seen as a single page.
#[derive(Debug, Clone)]
pub struct FlatDocument {
    text: String,
}

impl FlatDocument {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

impl PagedDocument for FlatDocument {
    fn page_count(&self) -> usize {
        1
    }

    fn page_text(&self, index: usize) -> Option<&str> {
        (index == 0).then_some(self.text.as_str())
    }

    fn toc(&self) -> &[TocEntry] {
        &[]
    }
}

pub struct Extractor {
    config: ExtractConfig,
    ocr: OcrChain,
}

impl Extractor {
    pub fn new(config: ExtractConfig, ocr: OcrChain) -> Self {
        Self { config, ocr }
    }

    pub fn from_config(config: ExtractConfig) -> Self {
        let ocr = OcrChain::from_config(&config);
        debug!(
            ocr_policy = config.ocr_policy.as_str(),
            ocr_lang = %config.ocr_lang,
            min_text_chars = config.min_text_chars,
            backends = ?ocr.backend_names(),
            "configured extractor"
        );
        Self::new(config, ocr)
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn ocr(&self) -> &OcrChain {
        &self.ocr
    }

    pub fn extract_text(&self, path: &Path) -> Result<String> {
        let kind = classify(path)?;
        info!(path = %path.display(), kind = kind.as_str(), "extracting text");

        let text = match kind {
            DocumentKind::Pdf => PdfDocument::read_pages(path, self)?
                .full_text()
                .trim()
                .to_string(),
            DocumentKind::Docx => docx_text(path)?,
            DocumentKind::Pptx => pptx_text(path)?,
            DocumentKind::Image => self.ocr_image_file(path)?,
        };

        info!(
            path = %path.display(),
            chars = text.chars().count(),
            "extracted text"
        );
        Ok(text)
    }

    /// PDFs keep their pages and outline; other kinds become a single page.
    pub fn load_document(&self, path: &Path) -> Result<Box<dyn PagedDocument>> {
        let document: Box<dyn PagedDocument> = match classify(path)? {
            DocumentKind::Pdf => Box::new(PdfDocument::open(path, self)?),
            DocumentKind::Docx | DocumentKind::Pptx | DocumentKind::Image => {
                Box::new(FlatDocument::new(self.extract_text(path)?))
            }
        };
        Ok(document)
    }

    fn ocr_image_file(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|err| PrepError::extraction(path, err))?;
        self.ocr.recognize(&bytes)
    }
}

pub fn extract_text(path: &Path, extractor: &Extractor) -> Result<String> {
    extractor.extract_text(path)
}

fn classify(path: &Path) -> Result<DocumentKind> {
    if !path.is_file() {
        return Err(PrepError::FileNotFound(path.to_path_buf()));
    }
    DocumentKind::from_path(path)
}
