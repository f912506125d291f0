use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::clean::clean_text;
use crate::cli::CleanArgs;
use crate::util::{char_count, emit_text};

pub fn run(args: CleanArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let cleaned = clean_text(&raw);
    info!(
        input = %args.input.display(),
        raw_chars = char_count(&raw),
        clean_chars = char_count(&cleaned),
        "cleaned text"
    );

    emit_text(args.output.as_deref(), &cleaned)
}
