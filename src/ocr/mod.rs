//! Image to text through an ordered list of OCR backends.

mod cloud;
mod tesseract;
#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExtractConfig;
use crate::error::{PrepError, Result};

pub use cloud::CloudOcr;
pub use tesseract::TesseractOcr;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("{0} is not configured")]
    Unconfigured(String),

    #[error("{backend} timed out after {seconds}s")]
    Timeout { backend: String, seconds: u64 },

    #[error("{backend} failed: {reason}")]
    Failed { backend: String, reason: String },
}

pub trait OcrBackend {
    fn name(&self) -> &str;

    fn recognize(&self, image: &[u8]) -> std::result::Result<String, OcrError>;
}

pub struct OcrChain {
    backends: Vec<Box<dyn OcrBackend>>,
}

impl OcrChain {
    pub fn new(backends: Vec<Box<dyn OcrBackend>>) -> Self {
        Self { backends }
    }

    /// Cloud API first, local tesseract second.
    pub fn from_config(config: &ExtractConfig) -> Self {
        let mut backends = Vec::<Box<dyn OcrBackend>>::with_capacity(2);

        match CloudOcr::new(&config.cloud) {
            Ok(cloud) => {
                if !cloud.is_configured() {
                    debug!("cloud OCR has no API key; tesseract will be used");
                }
                backends.push(Box::new(cloud));
            }
            Err(err) => warn!(error = %err, "cloud OCR backend disabled"),
        }
        backends.push(Box::new(TesseractOcr::new(config.ocr_lang.clone())));

        Self::new(backends)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Returns the first non-empty recognition result.
    pub fn recognize(&self, image: &[u8]) -> Result<String> {
        let mut attempts = Vec::<String>::with_capacity(self.backends.len());

        for backend in &self.backends {
            match backend.recognize(image) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(
                        backend = backend.name(),
                        image_bytes = image.len(),
                        chars = text.chars().count(),
                        "OCR succeeded"
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    warn!(backend = backend.name(), "OCR backend returned no text");
                    attempts.push(format!("{}: empty result", backend.name()));
                }
                Err(err) => {
                    warn!(backend = backend.name(), error = %err, "OCR backend skipped");
                    attempts.push(err.to_string());
                }
            }
        }

        if attempts.is_empty() {
            attempts.push("no OCR backends configured".to_string());
        }

        Err(PrepError::AllOcrBackendsUnavailable { attempts })
    }
}
