//! Record sinks and loaders for the tabular export format.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::record::{CleanRecord, RawRecord};

const BOM: &str = "\u{feff}";

/// One exported row: the raw columns followed by the derived ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(default)]
    pub proyecto: String,
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub proponente: String,
    #[serde(default)]
    pub autores: String,
    pub proyecto_limpio: Option<String>,
    pub fecha_limpia: Option<String>,
    pub titulo_limpio: Option<String>,
    pub partido_politico: String,
    /// Cleaned authors joined with `"; "`.
    pub autores_limpios: Option<String>,
    pub num_autores: usize,
    pub tipo_proyecto: String,
    pub region: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub fecha_datetime: Option<String>,
    #[serde(rename = "año")]
    pub anio: Option<i32>,
    pub mes: Option<u32>,
    /// English weekday name.
    pub dia_semana: Option<String>,
    pub estado_limpio: Option<String>,
}

impl From<&CleanRecord> for ExportRow {
    fn from(r: &CleanRecord) -> Self {
        let non_empty = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        let authors = r.authors_clean.join("; ");
        ExportRow {
            proyecto: r.raw.proyecto.clone(),
            fecha: r.raw.fecha.clone(),
            titulo: r.raw.titulo.clone(),
            estado: r.raw.estado.clone(),
            proponente: r.raw.proponente.clone(),
            autores: r.raw.autores.clone(),
            proyecto_limpio: r.proyecto_clean.clone(),
            fecha_limpia: r.fecha_clean.clone(),
            titulo_limpio: non_empty(&r.titulo_clean),
            partido_politico: r.political_party.to_string(),
            autores_limpios: non_empty(&authors),
            num_autores: r.author_count(),
            tipo_proyecto: r.project_category.to_string(),
            region: r.region.clone(),
            fecha_datetime: r.fecha_date.map(|d| d.format("%Y-%m-%d").to_string()),
            anio: r.fecha_date.map(|d| d.year()),
            mes: r.fecha_date.map(|d| d.month()),
            dia_semana: r.fecha_date.map(|d| d.format("%A").to_string()),
            estado_limpio: non_empty(&r.estado_clean),
        }
    }
}

impl ExportRow {
    /// The raw columns of this row.
    pub fn raw(&self) -> RawRecord {
        RawRecord {
            proyecto: self.proyecto.clone(),
            fecha: self.fecha.clone(),
            titulo: self.titulo.clone(),
            estado: self.estado.clone(),
            proponente: self.proponente.clone(),
            autores: self.autores.clone(),
        }
    }
}

/// Writes a record set to `path`, returning where it ended up.
pub trait RecordSink {
    fn write(&self, records: &[CleanRecord], path: &Path) -> Result<PathBuf, ExportError>;
}

/// UTF-8 CSV with a byte-order mark so spreadsheets pick the right encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSink;

impl RecordSink for CsvSink {
    fn write(&self, records: &[CleanRecord], path: &Path) -> Result<PathBuf, ExportError> {
        if records.is_empty() {
            return Err(ExportError::Empty);
        }
        let mut out = BufWriter::new(create(path)?);
        out.write_all(BOM.as_bytes())?;
        let mut writer = csv::Writer::from_writer(out);
        for record in records {
            writer.serialize(ExportRow::from(record))?;
        }
        writer.flush()?;
        tracing::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Pretty-printed JSON array of export rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl RecordSink for JsonSink {
    fn write(&self, records: &[CleanRecord], path: &Path) -> Result<PathBuf, ExportError> {
        if records.is_empty() {
            return Err(ExportError::Empty);
        }
        let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
        let mut out = BufWriter::new(create(path)?);
        serde_json::to_writer_pretty(&mut out, &rows)?;
        out.flush()?;
        tracing::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Sink chosen from the file extension; CSV unless it ends in `.json`.
pub fn sink_for(path: &Path) -> Box<dyn RecordSink> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Box::new(JsonSink),
        _ => Box::new(CsvSink),
    }
}

fn create(path: &Path) -> Result<File, ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn read_without_bom(path: &Path) -> Result<String, ExportError> {
    let text = fs::read_to_string(path)?;
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Raw columns of any CSV export. Extra columns are ignored, missing ones
/// come back empty.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>, ExportError> {
    let text = read_without_bom(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize::<RawRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// Rows of a CSV previously written by [`CsvSink`].
pub fn load_export_rows(path: &Path) -> Result<Vec<ExportRow>, ExportError> {
    let text = read_without_bom(path)?;
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize::<ExportRow>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// `<dir>/proyectos_ley_<YYYYmmdd_HHMMSS>.csv`
pub fn default_output_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("proyectos_ley_{}.csv", now.format("%Y%m%d_%H%M%S")))
}

/// `<input stem>_limpio.csv` next to the input.
pub fn clean_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proyectos".to_string());
    input.with_file_name(format!("{}_limpio.csv", stem))
}
