use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use spley_lib::{load_raw_records, sink_for, ValidationReport, Validator};

#[derive(Args)]
pub struct ValidateArgs {
    /// Raw CSV export to validate
    pub input: PathBuf,

    /// Write the report as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write the records that passed validation to this file (.csv or .json)
    #[arg(long)]
    pub valid_output: Option<PathBuf>,

    /// Exit with an error when any record is invalid
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &ValidateArgs) -> Result<()> {
    let raw = load_raw_records(&args.input)?;
    let (valid, report) = Validator::new().validate_batch(&raw);
    println!("{}", report.summary_text());

    if let Some(ref path) = args.output {
        write_report(&report, path)?;
        eprintln!("Report written to {}", path.display());
    }

    if let Some(ref path) = args.valid_output {
        if valid.is_empty() {
            eprintln!("No valid records to write.");
        } else {
            let written = sink_for(path).write(&valid, path)?;
            eprintln!("Wrote {} valid bills to {}", valid.len(), written.display());
        }
    }

    if args.strict && report.invalid_records > 0 {
        bail!(
            "{} of {} records are invalid",
            report.invalid_records,
            report.total_records
        );
    }
    Ok(())
}

fn write_report(report: &ValidationReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, report)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "proyecto,fecha,titulo,estado,proponente,autores\n";

    fn args(input: PathBuf, strict: bool) -> ValidateArgs {
        ValidateArgs {
            input,
            output: None,
            valid_output: None,
            strict,
        }
    }

    #[test]
    fn strict_fails_on_invalid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(
            &input,
            format!(
                "{}Proyecto de Ley 12345/2024-CR,15/06/2024,Ley de Reforma Educativa,APROBADO,CONGRESO,Juan Pérez - PERU LIBRE\n,15/06/2024,x,APROBADO,CONGRESO,\n",
                HEADER
            ),
        )
        .unwrap();

        assert!(run(&args(input.clone(), false)).is_ok());
        let err = run(&args(input, true)).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 records are invalid");
    }

    #[test]
    fn report_and_valid_rows_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(
            &input,
            format!(
                "{}Proyecto de Ley 12345/2024-CR,15/06/2024,Ley de Reforma Educativa,APROBADO,CONGRESO,\n",
                HEADER
            ),
        )
        .unwrap();
        let report_path = dir.path().join("report.json");
        let valid_path = dir.path().join("valid.csv");

        run(&ValidateArgs {
            input,
            output: Some(report_path.clone()),
            valid_output: Some(valid_path.clone()),
            strict: true,
        })
        .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(report["valid_records"], 1);
        assert_eq!(report["field_warnings"]["autores"], 1);
        assert!(valid_path.exists());
    }
}
