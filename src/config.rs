use std::time::Duration;

pub const DEFAULT_MIN_TEXT_CHARS: usize = 50;
pub const DEFAULT_OCR_DPI: u32 = 200;
pub const DEFAULT_OCR_LANG: &str = "chi_sim+eng";
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CLOUD_OCR_URL: &str = "https://api.siliconflow.cn/v1/images/ocr";

/// When PDF extraction falls back to OCR.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OcrPolicy {
    /// Only when the text layer is shorter than `min_text_chars`.
    Auto,
    Force,
    Off,
}

impl OcrPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Force => "force",
            Self::Off => "off",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CloudOcrConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for CloudOcrConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_CLOUD_OCR_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExtractConfig {
    pub ocr_policy: OcrPolicy,
    pub ocr_lang: String,
    pub min_text_chars: usize,
    pub ocr_dpi: u32,
    pub cloud: CloudOcrConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            ocr_policy: OcrPolicy::Auto,
            ocr_lang: DEFAULT_OCR_LANG.to_string(),
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            ocr_dpi: DEFAULT_OCR_DPI,
            cloud: CloudOcrConfig::default(),
        }
    }
}
