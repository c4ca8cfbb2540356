//! Record validation: the gate between scraped rows and exported data.
//!
//! Errors reject a record, warnings only annotate it. Messages are in Spanish
//! because they end up in reports read by the portal's users.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::normalize::{
    classify_category, classify_party, clean_bill_id, clean_date, clean_proponent, clean_state,
    clean_title, extract_region, parse_date, split_authors,
};
use crate::record::{CleanRecord, RawRecord};

pub const FIELD_PROYECTO: &str = "proyecto";
pub const FIELD_FECHA: &str = "fecha";
pub const FIELD_TITULO: &str = "titulo";
pub const FIELD_ESTADO: &str = "estado";
pub const FIELD_PROPONENTE: &str = "proponente";
pub const FIELD_AUTORES: &str = "autores";
/// Cross-field findings.
pub const FIELD_REGISTRO: &str = "registro";

pub const KNOWN_STATES: &[&str] = &[
    "ENVIADO",
    "RECIBIDO",
    "DERIVADO",
    "OBSERVADO",
    "APROBADO",
    "RECHAZADO",
    "ARCHIVADO",
    "RETIRADO",
    "PRESENTADO",
    "PUBLICADO",
];

pub const KNOWN_PROPONENT_TYPES: &[&str] = &[
    "CONGRESO",
    "CONGRESISTA",
    "CONGRESISTAS",
    "PRESIDENTE",
    "COMISION",
    "MESA DIRECTIVA",
    "GRUPO PARLAMENTARIO",
];

const PLACEHOLDER_TITLES: &[&str] = &["test", "prueba", "ejemplo"];

pub const MIN_TITLE_CHARS: usize = 10;
pub const MAX_TITLE_CHARS: usize = 500;
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2030;
pub const OLD_YEAR: i32 = 2010;

static BILL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d{4}-[A-Z]+$").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());
static STATE_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-ZÁÉÍÓÚÜÑ ]+$").unwrap());
static PROPONENT_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-ZÁÉÍÓÚÜÑ0-9 .,()\-]+$").unwrap());
static PLACEHOLDER_AUTHORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(test|prueba|ejemplo|n/?a|x+|-+)\s*$").unwrap());

/// Outcome of one field check: the value to emit plus findings.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCheck<T> {
    pub value: T,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl<T> FieldCheck<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(mut self, msg: impl Into<String>) -> Self {
        self.errors.push(msg.into());
        self
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_bill_id(raw: &str) -> FieldCheck<Option<String>> {
    let cleaned = clean_bill_id(raw);
    let Some(id) = cleaned.as_deref() else {
        return FieldCheck::new(None).error("Número de proyecto es requerido");
    };
    let mut check = FieldCheck::new(Some(id.to_string()));
    if !BILL_ID_RE.is_match(id) {
        check.warn(format!("Formato de proyecto inusual: {}", id));
    }
    check
}

/// Date text and parsed date. `today` decides what counts as the future.
pub fn validate_date(raw: &str, today: NaiveDate) -> FieldCheck<Option<(String, NaiveDate)>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldCheck::new(None).error("Fecha es requerida");
    }
    let candidate = clean_date(trimmed).unwrap_or_else(|| trimmed.to_string());
    if !DATE_RE.is_match(&candidate) {
        return FieldCheck::new(None).error(format!("Formato de fecha inválido: {}", trimmed));
    }
    let Some(date) = parse_date(&candidate) else {
        return FieldCheck::new(None).error(format!("Fecha inválida: {}", candidate));
    };

    let mut check = FieldCheck::new(Some((candidate, date)));
    let year = date.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        check.warn(format!("Año inusual: {}", year));
    }
    if date > today {
        check.warn(format!("Fecha en el futuro: {}", date.format("%d/%m/%Y")));
    }
    if year < OLD_YEAR {
        check.warn(format!("Fecha muy antigua: {}", date.format("%d/%m/%Y")));
    }
    check
}

pub fn validate_title(raw: &str) -> FieldCheck<String> {
    let cleaned = clean_title(raw);
    if cleaned.is_empty() {
        return FieldCheck::new(cleaned).error("Título es requerido");
    }
    let mut check = FieldCheck::new(cleaned);
    let len = check.value.chars().count();
    if len < MIN_TITLE_CHARS {
        check.warn(format!("Título muy corto ({} caracteres)", len));
    }
    if len > MAX_TITLE_CHARS {
        check.warn(format!("Título muy largo ({} caracteres)", len));
    }
    if PLACEHOLDER_TITLES.contains(&check.value.to_lowercase().as_str()) {
        check.warn("Título parece ser de prueba");
    }
    check
}

pub fn validate_state(raw: &str) -> FieldCheck<String> {
    let cleaned = clean_state(raw);
    if cleaned.is_empty() {
        return FieldCheck::new(cleaned).error("Estado es requerido");
    }
    let mut check = FieldCheck::new(cleaned);
    if !STATE_CHARS_RE.is_match(&check.value) {
        check.warn(format!("Estado con caracteres inusuales: {}", check.value));
    }
    if !KNOWN_STATES.contains(&check.value.as_str()) {
        check.warn(format!("Estado no reconocido: {}", check.value));
    }
    check
}

pub fn validate_proponent(raw: &str) -> FieldCheck<String> {
    let cleaned = clean_proponent(raw);
    if cleaned.is_empty() {
        return FieldCheck::new(cleaned).error("Proponente es requerido");
    }
    let mut check = FieldCheck::new(cleaned);
    if !PROPONENT_CHARS_RE.is_match(&check.value) {
        check.warn(format!("Proponente con caracteres inusuales: {}", check.value));
    }
    if !KNOWN_PROPONENT_TYPES
        .iter()
        .any(|kind| check.value.contains(kind))
    {
        check.warn(format!("Tipo de proponente no reconocido: {}", check.value));
    }
    check
}

/// Author names. Never produces errors: a bill without listed authors is
/// still a valid record.
pub fn validate_authors(raw: &str) -> FieldCheck<Vec<String>> {
    let trimmed = raw.trim();
    let mut check = FieldCheck::new(Vec::new());
    if trimmed.is_empty() {
        check.warn("Lista de autores vacía");
        return check;
    }
    if trimmed.chars().count() < 3 {
        check.warn("Lista de autores muy corta");
    }
    if PLACEHOLDER_AUTHORS_RE.is_match(trimmed) {
        check.warn("Lista de autores parece ser de prueba");
    }
    for author in split_authors(trimmed) {
        if author.chars().count() <= 2 {
            check.warn(format!("Autor inválido o muy corto: {}", author));
        } else {
            check.value.push(author);
        }
    }
    check
}

/// Findings that involve more than one field. Warnings only.
pub fn check_consistency(state: &str, title: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if state.to_uppercase().contains("ARCHIVADO") && title.to_uppercase().contains("NUEVO") {
        warnings.push("Proyecto archivado pero título sugiere que es nuevo".to_string());
    }
    warnings
}

/// Every finding for one record plus the cleaned record itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValidation {
    pub record: CleanRecord,
    /// Errors keyed by field name. Fields without errors are absent.
    pub errors: BTreeMap<&'static str, Vec<String>>,
    pub warnings: BTreeMap<&'static str, Vec<String>>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    /// All error messages prefixed with their field, for display.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{}: {}", field, m)))
            .collect()
    }
}

/// Aggregate of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub field_errors: BTreeMap<String, usize>,
    pub field_warnings: BTreeMap<String, usize>,
}

impl ValidationReport {
    pub fn from_results(results: &[RecordValidation]) -> Self {
        let mut report = ValidationReport {
            total_records: results.len(),
            ..ValidationReport::default()
        };
        for result in results {
            if result.is_valid() {
                report.valid_records += 1;
            } else {
                report.invalid_records += 1;
            }
            for (field, msgs) in &result.errors {
                if !msgs.is_empty() {
                    *report.field_errors.entry(field.to_string()).or_default() += msgs.len();
                    report.total_errors += msgs.len();
                }
            }
            for (field, msgs) in &result.warnings {
                if !msgs.is_empty() {
                    *report.field_warnings.entry(field.to_string()).or_default() += msgs.len();
                    report.total_warnings += msgs.len();
                }
            }
        }
        report
    }

    /// Share of valid records, 0-100.
    pub fn validity_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.valid_records as f64 * 100.0 / self.total_records as f64
        }
    }

    /// Plain-text report for logs and the terminal.
    pub fn summary_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "RESUMEN DE VALIDACIÓN");
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out, "Total de registros: {}", self.total_records);
        let _ = writeln!(
            out,
            "Registros válidos: {} ({:.1}%)",
            self.valid_records,
            self.validity_rate()
        );
        let _ = writeln!(out, "Registros inválidos: {}", self.invalid_records);
        let _ = writeln!(out, "Total de errores: {}", self.total_errors);
        let _ = writeln!(out, "Total de advertencias: {}", self.total_warnings);
        if !self.field_errors.is_empty() {
            let _ = writeln!(out, "\nErrores por campo:");
            for (field, count) in &self.field_errors {
                let _ = writeln!(out, "  {}: {}", field, count);
            }
        }
        if !self.field_warnings.is_empty() {
            let _ = writeln!(out, "\nAdvertencias por campo:");
            for (field, count) in &self.field_warnings {
                let _ = writeln!(out, "  {}: {}", field, count);
            }
        }
        out
    }
}

/// Validates records against a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    today: NaiveDate,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn validate_record(&self, raw: &RawRecord) -> RecordValidation {
        let proyecto = validate_bill_id(&raw.proyecto);
        let fecha = validate_date(&raw.fecha, self.today);
        let titulo = validate_title(&raw.titulo);
        let estado = validate_state(&raw.estado);
        let proponente = validate_proponent(&raw.proponente);
        let autores = validate_authors(&raw.autores);
        let cross = check_consistency(&estado.value, &titulo.value);

        let mut errors = BTreeMap::new();
        let mut warnings = BTreeMap::new();
        let mut collect = |field: &'static str, errs: Vec<String>, warns: Vec<String>| {
            if !errs.is_empty() {
                errors.insert(field, errs);
            }
            if !warns.is_empty() {
                warnings.insert(field, warns);
            }
        };
        collect(FIELD_PROYECTO, proyecto.errors, proyecto.warnings);
        collect(FIELD_FECHA, fecha.errors, fecha.warnings);
        collect(FIELD_TITULO, titulo.errors, titulo.warnings);
        collect(FIELD_ESTADO, estado.errors, estado.warnings);
        collect(FIELD_PROPONENTE, proponente.errors, proponente.warnings);
        collect(FIELD_AUTORES, autores.errors, autores.warnings);
        collect(FIELD_REGISTRO, Vec::new(), cross);

        let (fecha_clean, fecha_date) = match fecha.value {
            Some((text, date)) => (Some(text), Some(date)),
            None => (None, None),
        };
        let political_party = classify_party(&autores.value.join(", "));
        let record = CleanRecord {
            raw: raw.clone(),
            proyecto_clean: proyecto.value,
            fecha_clean,
            fecha_date,
            project_category: classify_category(&titulo.value),
            region: extract_region(&titulo.value).map(str::to_string),
            titulo_clean: titulo.value,
            estado_clean: estado.value,
            proponente_clean: proponente.value,
            authors_clean: autores.value,
            political_party,
        };

        RecordValidation {
            record,
            errors,
            warnings,
        }
    }

    pub fn validate_all(&self, records: &[RawRecord]) -> Vec<RecordValidation> {
        records.iter().map(|r| self.validate_record(r)).collect()
    }

    /// Validates a batch; returns the records without errors and the report.
    pub fn validate_batch(&self, records: &[RawRecord]) -> (Vec<CleanRecord>, ValidationReport) {
        let results = self.validate_all(records);
        let report = ValidationReport::from_results(&results);
        for (index, result) in results.iter().enumerate() {
            if !result.is_valid() {
                tracing::debug!(
                    "Record {} rejected: {}",
                    index + 1,
                    result.error_messages().join("; ")
                );
            }
        }
        tracing::info!(
            "Validation complete: {} valid, {} invalid, {} warnings",
            report.valid_records,
            report.invalid_records,
            report.total_warnings
        );
        let valid = results
            .into_iter()
            .filter(RecordValidation::is_valid)
            .map(|r| r.record)
            .collect();
        (valid, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PoliticalParty, ProjectCategory};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn good_raw() -> RawRecord {
        RawRecord {
            proyecto: "Proyecto de Ley 12345/2024-CR".into(),
            fecha: "Fecha de Presentación15/06/2024".into(),
            titulo: "Ley de Reforma Educativa".into(),
            estado: "APROBADO".into(),
            proponente: "CONGRESO".into(),
            autores: "Juan Pérez - PERU LIBRE".into(),
        }
    }

    #[test]
    fn bill_id_required() {
        let check = validate_bill_id("  ");
        assert_eq!(check.errors, vec!["Número de proyecto es requerido"]);
        assert_eq!(check.value, None);
    }

    #[test]
    fn bill_id_unusual_format_only_warns() {
        let check = validate_bill_id("PL-sin-numero");
        assert!(check.is_ok());
        assert_eq!(check.warnings.len(), 1);
        assert_eq!(check.value.as_deref(), Some("PL-sin-numero"));
    }

    #[test]
    fn date_required_and_format() {
        assert_eq!(validate_date("", today()).errors, vec!["Fecha es requerida"]);
        let check = validate_date("junio 2024", today());
        assert!(check.errors[0].starts_with("Formato de fecha inválido"));
    }

    #[test]
    fn date_calendar_failure_is_error() {
        let check = validate_date("32/13/2024", today());
        assert_eq!(check.errors, vec!["Fecha inválida: 32/13/2024"]);
    }

    #[test]
    fn date_future_and_old_warn() {
        let future = validate_date("01/01/2025", today());
        assert!(future.is_ok());
        assert!(future.warnings[0].starts_with("Fecha en el futuro"));

        let old = validate_date("01/01/1999", today());
        assert!(old.is_ok());
        assert_eq!(old.warnings.len(), 2);
        assert!(old.warnings[0].starts_with("Año inusual"));
        assert!(old.warnings[1].starts_with("Fecha muy antigua"));
    }

    #[test]
    fn title_rules() {
        assert_eq!(validate_title("  ").errors, vec!["Título es requerido"]);
        let short = validate_title("x");
        assert!(short.is_ok());
        assert!(short.warnings[0].starts_with("Título muy corto"));
        let test = validate_title("Prueba");
        assert!(test.warnings.iter().any(|w| w == "Título parece ser de prueba"));
        let long = validate_title(&"a".repeat(501));
        assert!(long.warnings[0].starts_with("Título muy largo"));
    }

    #[test]
    fn state_rules() {
        assert_eq!(validate_state("").errors, vec!["Estado es requerido"]);
        assert!(validate_state("Aprobado").warnings.is_empty());
        let unknown = validate_state("EN COMISIÓN");
        assert!(unknown.is_ok());
        assert_eq!(unknown.warnings, vec!["Estado no reconocido: EN COMISIÓN"]);
    }

    #[test]
    fn proponent_rules() {
        assert_eq!(validate_proponent("").errors, vec!["Proponente es requerido"]);
        assert!(validate_proponent("CONGRESO").warnings.is_empty());
        let odd = validate_proponent("PODER EJECUTIVO");
        assert_eq!(odd.warnings, vec!["Tipo de proponente no reconocido: PODER EJECUTIVO"]);
    }

    #[test]
    fn authors_empty_is_warning_only() {
        let check = validate_authors("");
        assert!(check.is_ok());
        assert_eq!(check.warnings, vec!["Lista de autores vacía"]);
    }

    #[test]
    fn authors_short_tokens_dropped() {
        let check = validate_authors("Ana Soto, JP, Luis Paz");
        assert!(check.is_ok());
        assert_eq!(check.value, vec!["Ana Soto", "Luis Paz"]);
        assert_eq!(check.warnings, vec!["Autor inválido o muy corto: JP"]);
    }

    #[test]
    fn authors_placeholder_flagged() {
        let check = validate_authors("N/A");
        assert!(check.is_ok());
        assert!(check
            .warnings
            .contains(&"Lista de autores parece ser de prueba".to_string()));
    }

    #[test]
    fn archived_new_title_warns() {
        assert_eq!(check_consistency("ARCHIVADO", "Nueva ley").len(), 0);
        assert_eq!(check_consistency("ARCHIVADO", "Crea el nuevo registro").len(), 1);
        assert!(check_consistency("APROBADO", "Crea el nuevo registro").is_empty());
    }

    #[test]
    fn record_with_only_warnings_is_valid() {
        let raw = RawRecord {
            autores: String::new(),
            estado: "EN COMISIÓN".into(),
            ..good_raw()
        };
        let result = Validator::with_today(today()).validate_record(&raw);
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 2);
        assert_eq!(result.record.political_party, PoliticalParty::Desconocido);
    }

    #[test]
    fn missing_required_fields_invalidate() {
        let validator = Validator::with_today(today());
        for raw in [
            RawRecord { proyecto: String::new(), ..good_raw() },
            RawRecord { fecha: String::new(), ..good_raw() },
            RawRecord { titulo: String::new(), ..good_raw() },
        ] {
            let result = validator.validate_record(&raw);
            assert!(!result.is_valid(), "{:?}", raw);
        }
    }

    #[test]
    fn valid_record_carries_cleaned_values() {
        let result = Validator::with_today(today()).validate_record(&good_raw());
        assert!(result.is_valid());
        let r = result.record;
        assert_eq!(r.proyecto_clean.as_deref(), Some("12345/2024-CR"));
        assert_eq!(r.fecha_clean.as_deref(), Some("15/06/2024"));
        assert_eq!(r.political_party, PoliticalParty::PeruLibre);
        assert_eq!(r.project_category, ProjectCategory::Educacion);
    }

    #[test]
    fn batch_report_counts_fields() {
        let rows = vec![
            good_raw(),
            RawRecord {
                proyecto: String::new(),
                fecha: "15/06/2024".into(),
                titulo: "x".into(),
                estado: "APROBADO".into(),
                proponente: "CONGRESO".into(),
                autores: String::new(),
            },
        ];
        let (valid, report) = Validator::with_today(today()).validate_batch(&rows);
        assert_eq!(valid.len(), 1);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.valid_records, 1);
        assert_eq!(report.invalid_records, 1);
        assert_eq!(report.total_errors, 1);
        assert_eq!(report.field_errors.get("proyecto"), Some(&1));
        assert_eq!(report.field_warnings.get("titulo"), Some(&1));
        assert_eq!(report.field_warnings.get("autores"), Some(&1));
        assert_eq!(report.total_warnings, 2);
    }

    #[test]
    fn revalidating_clean_records_adds_no_errors() {
        let validator = Validator::with_today(today());
        let rows = vec![
            good_raw(),
            RawRecord {
                autores: "Ana Soto, JP, Luis Paz ver más...".into(),
                estado: "Estado: ARCHIVADO".into(),
                ..good_raw()
            },
        ];
        let (first, first_report) = validator.validate_batch(&rows);
        let again: Vec<RawRecord> = first.iter().map(CleanRecord::to_raw).collect();
        let (second, second_report) = validator.validate_batch(&again);
        assert_eq!(second_report.total_errors, 0);
        assert_eq!(second_report.valid_records, first_report.valid_records);
        assert_eq!(second.len(), first.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.proyecto_clean, b.proyecto_clean);
            assert_eq!(a.authors_clean, b.authors_clean);
            assert_eq!(a.political_party, b.political_party);
            assert_eq!(a.project_category, b.project_category);
        }
    }

    #[test]
    fn summary_text_lists_fields() {
        let report = ValidationReport {
            total_records: 4,
            valid_records: 3,
            invalid_records: 1,
            total_errors: 1,
            total_warnings: 2,
            field_errors: BTreeMap::from([("fecha".to_string(), 1)]),
            field_warnings: BTreeMap::from([("autores".to_string(), 2)]),
        };
        let text = report.summary_text();
        assert!(text.starts_with("RESUMEN DE VALIDACIÓN"));
        assert!(text.contains("Registros válidos: 3 (75.0%)"));
        assert!(text.contains("  fecha: 1"));
        assert!(text.contains("  autores: 2"));
    }
}
