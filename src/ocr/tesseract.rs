use std::io::Write;
use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

use super::{OcrBackend, OcrError};
use crate::util::command_available;

const BACKEND_NAME: &str = "tesseract";

/// Local tesseract binary. Availability is probed once per engine.
pub struct TesseractOcr {
    lang: String,
    available: OnceLock<bool>,
}

impl TesseractOcr {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            available: OnceLock::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = command_available("tesseract");
            debug!(available, lang = %self.lang, "probed tesseract");
            available
        })
    }

    fn failed(reason: impl Into<String>) -> OcrError {
        OcrError::Failed {
            backend: BACKEND_NAME.to_string(),
            reason: reason.into(),
        }
    }
}

impl OcrBackend for TesseractOcr {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        if !self.is_available() {
            return Err(OcrError::Unconfigured(format!(
                "{} (binary not found on PATH)",
                BACKEND_NAME
            )));
        }

        let mut input = tempfile::Builder::new()
            .prefix("quizprep_ocr_")
            .tempfile()
            .map_err(|err| Self::failed(format!("failed to create temp image: {}", err)))?;
        input
            .write_all(image)
            .and_then(|_| input.flush())
            .map_err(|err| Self::failed(format!("failed to write temp image: {}", err)))?;

        let output = Command::new("tesseract")
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .output()
            .map_err(|err| Self::failed(format!("failed to execute tesseract: {}", err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failed(format!(
                "non-zero exit status: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .replace('\u{0000}', "")
            .trim()
            .to_string())
    }
}
