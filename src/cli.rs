use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{
    CloudOcrConfig, DEFAULT_CLOUD_OCR_URL, DEFAULT_MIN_TEXT_CHARS, DEFAULT_OCR_DPI,
    DEFAULT_OCR_LANG, DEFAULT_OCR_TIMEOUT_SECS, ExtractConfig, OcrPolicy,
};

#[derive(Parser, Debug)]
#[command(
    name = "quizprep",
    version,
    about = "Textbook text extraction and chapter preparation for quiz generation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract plain text from a PDF, DOCX, PPTX or image.
    Extract(ExtractArgs),
    /// Split a document into chapters by heading lines.
    Split(SplitArgs),
    /// Locate chapters by number and write cleaned text per chapter.
    Chapter(ChapterArgs),
    /// Clean an already extracted text file.
    Clean(CleanArgs),
    /// Print the PDF outline with parsed chapter numbers.
    Toc(TocArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrMode {
    Auto,
    Force,
    Off,
}

impl From<OcrMode> for OcrPolicy {
    fn from(mode: OcrMode) -> Self {
        match mode {
            OcrMode::Auto => Self::Auto,
            OcrMode::Force => Self::Force,
            OcrMode::Off => Self::Off,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OcrArgs {
    #[arg(long, value_enum, default_value_t = OcrMode::Auto)]
    pub ocr_mode: OcrMode,

    #[arg(long, default_value = DEFAULT_OCR_LANG)]
    pub ocr_lang: String,

    /// PDFs whose text layer has fewer characters than this are OCRed.
    #[arg(long, default_value_t = DEFAULT_MIN_TEXT_CHARS)]
    pub min_text_chars: usize,

    #[arg(long, default_value_t = DEFAULT_OCR_DPI)]
    pub ocr_dpi: u32,

    #[arg(long, env = "QUIZPREP_OCR_API_URL", default_value = DEFAULT_CLOUD_OCR_URL)]
    pub ocr_api_url: String,

    #[arg(long, env = "SILICONFLOW_API_KEY", hide_env_values = true)]
    pub ocr_api_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_OCR_TIMEOUT_SECS)]
    pub ocr_timeout_secs: u64,
}

impl OcrArgs {
    pub fn to_config(&self) -> ExtractConfig {
        ExtractConfig {
            ocr_policy: self.ocr_mode.into(),
            ocr_lang: self.ocr_lang.clone(),
            min_text_chars: self.min_text_chars,
            ocr_dpi: self.ocr_dpi,
            cloud: CloudOcrConfig {
                api_url: self.ocr_api_url.clone(),
                api_key: self.ocr_api_key.clone(),
                timeout: Duration::from_secs(self.ocr_timeout_secs),
            },
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    pub path: PathBuf,

    /// Defaults to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub ocr: OcrArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    pub path: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Run the text cleaner over each chapter before writing.
    #[arg(long, default_value_t = false)]
    pub clean: bool,

    #[command(flatten)]
    pub ocr: OcrArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ChapterArgs {
    pub path: PathBuf,

    /// Chapter identifiers such as `2`, `第2章` or `第十二章`; repeat or
    /// separate with commas.
    #[arg(long = "chapter", required = true, value_delimiter = ',')]
    pub chapters: Vec<String>,

    #[arg(long, default_value = "chapters")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub skip_existing: bool,

    /// Write the located text without cleaning it.
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    #[arg(long)]
    pub max_chars: Option<usize>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[command(flatten)]
    pub ocr: OcrArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TocArgs {
    pub path: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chapter_list_accepts_commas_and_repeats() {
        let cli = Cli::try_parse_from([
            "quizprep",
            "chapter",
            "book.pdf",
            "--chapter",
            "1,2",
            "--chapter",
            "第十二章",
            "--ocr-mode",
            "off",
            "--max-chars",
            "5000",
        ])
        .expect("valid arguments");

        let Commands::Chapter(args) = cli.command else {
            panic!("expected chapter command");
        };
        assert_eq!(args.chapters, vec!["1", "2", "第十二章"]);
        assert_eq!(args.max_chars, Some(5000));
        assert_eq!(args.ocr.to_config().ocr_policy, OcrPolicy::Off);
    }

    #[test]
    fn ocr_defaults_match_extract_config() {
        let cli = Cli::try_parse_from(["quizprep", "extract", "scan.png"]).expect("valid");

        let Commands::Extract(args) = cli.command else {
            panic!("expected extract command");
        };
        let config = args.ocr.to_config();
        let defaults = ExtractConfig::default();
        assert_eq!(config.ocr_policy, defaults.ocr_policy);
        assert_eq!(config.min_text_chars, defaults.min_text_chars);
        assert_eq!(config.ocr_dpi, defaults.ocr_dpi);
        assert_eq!(config.ocr_lang, defaults.ocr_lang);
        assert_eq!(config.cloud.timeout, defaults.cloud.timeout);
    }
}
