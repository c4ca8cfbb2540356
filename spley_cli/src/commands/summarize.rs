use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use spley_lib::{load_raw_records, normalize_batch, summarize};

use crate::output::{print_summary, OutputFormat};

#[derive(Args)]
pub struct SummarizeArgs {
    /// CSV export, raw or cleaned
    pub input: PathBuf,
}

pub fn run(args: &SummarizeArgs, format: &OutputFormat) -> Result<()> {
    let raw = load_raw_records(&args.input)?;
    if raw.is_empty() {
        bail!("{} has no rows", args.input.display());
    }
    let summary = summarize(&normalize_batch(&raw));
    print_summary(&summary, format)
}
