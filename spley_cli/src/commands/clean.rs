use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use spley_lib::{clean_output_path, load_raw_records, normalize_batch, sink_for, summarize};

use crate::output::{print_summary, OutputFormat};

#[derive(Args)]
pub struct CleanArgs {
    /// Raw CSV export to clean
    pub input: PathBuf,

    /// Destination file (.csv or .json); defaults to <input>_limpio.csv
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the dataset summary afterwards
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: &CleanArgs, format: &OutputFormat) -> Result<()> {
    let raw = load_raw_records(&args.input)?;
    if raw.is_empty() {
        bail!("{} has no rows", args.input.display());
    }
    tracing::info!("Loaded {} rows from {}", raw.len(), args.input.display());

    let records = normalize_batch(&raw);
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| clean_output_path(&args.input));
    let written = sink_for(&path).write(&records, &path)?;
    eprintln!("Cleaned {} bills into {}", records.len(), written.display());

    if args.summary {
        print_summary(&summarize(&records), format)?;
    }
    Ok(())
}
