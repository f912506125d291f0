use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{OcrBackend, OcrError};
use crate::config::CloudOcrConfig;

const BACKEND_NAME: &str = "cloud-ocr";

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image_base64: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Multimodal OCR over HTTP. Unconfigured until an API key is supplied.
pub struct CloudOcr {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CloudOcr {
    pub fn new(config: &CloudOcrConfig) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| OcrError::Failed {
                backend: BACKEND_NAME.to_string(),
                reason: format!("failed to create HTTP client: {}", err),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            timeout: config.timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_error(&self, err: reqwest::Error) -> OcrError {
        if err.is_timeout() {
            OcrError::Timeout {
                backend: BACKEND_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            OcrError::Failed {
                backend: BACKEND_NAME.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl OcrBackend for CloudOcr {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(OcrError::Unconfigured(format!(
                "{} (no API key)",
                BACKEND_NAME
            )));
        };

        let encoded = STANDARD.encode(image);
        let request = OcrRequest {
            image_base64: &encoded,
            language: "auto",
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(|err| self.request_error(err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(OcrError::Failed {
                backend: BACKEND_NAME.to_string(),
                reason: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        let parsed: OcrResponse = response.json().map_err(|err| self.request_error(err))?;

        Ok(parsed.text.unwrap_or_default().trim().to_string())
    }
}
