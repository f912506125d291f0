use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExtractArgs;
use crate::extract::{Extractor, extract_text};
use crate::util::{char_count, emit_text};

pub fn run(args: ExtractArgs) -> Result<()> {
    let extractor = Extractor::from_config(args.ocr.to_config());

    let text = extract_text(&args.path, &extractor)
        .with_context(|| format!("failed to extract text from {}", args.path.display()))?;

    emit_text(args.output.as_deref(), &text)?;
    if let Some(output) = &args.output {
        info!(
            path = %output.display(),
            chars = char_count(&text),
            "wrote extracted text"
        );
    }

    Ok(())
}
