//! Dataset summaries over cleaned records.
//!
//! Pure aggregation: no I/O, no network.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::CleanRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub by_party: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_region: BTreeMap<String, usize>,
    pub by_state: BTreeMap<String, usize>,
    pub average_authors: f64,
    /// Most frequent author name and how many bills list it.
    pub most_active_author: Option<(String, usize)>,
}

pub fn summarize(records: &[CleanRecord]) -> DatasetSummary {
    let dates = records.iter().filter_map(|r| r.fecha_date);
    let average_authors = if records.is_empty() {
        0.0
    } else {
        records.iter().map(CleanRecord::author_count).sum::<usize>() as f64 / records.len() as f64
    };
    DatasetSummary {
        total_records: records.len(),
        first_date: dates.clone().min(),
        last_date: dates.max(),
        by_party: count_by(records, |r| Some(r.political_party.to_string())),
        by_category: count_by(records, |r| Some(r.project_category.to_string())),
        by_region: count_by(records, |r| r.region.clone()),
        by_state: count_by(records, |r| {
            if r.estado_clean.is_empty() {
                None
            } else {
                Some(r.estado_clean.clone())
            }
        }),
        average_authors,
        most_active_author: top_authors(records, 1).into_iter().next(),
    }
}

/// Counts records per key; records without a key are left out.
pub fn count_by<F>(records: &[CleanRecord], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&CleanRecord) -> Option<String>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            *counts.entry(k).or_default() += 1;
        }
    }
    counts
}

/// Authors by number of bills, most active first, ties alphabetical.
pub fn top_authors(records: &[CleanRecord], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for author in &record.authors_clean {
            *counts.entry(author.as_str()).or_default() += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, n)| (name.to_string(), n))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(limit);
    sorted
}

/// Counts sorted by count descending, for display.
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_record;
    use crate::record::RawRecord;

    fn rec(fecha: &str, titulo: &str, autores: &str, estado: &str) -> CleanRecord {
        normalize_record(&RawRecord {
            proyecto: "1/2024-CR".into(),
            fecha: fecha.into(),
            titulo: titulo.into(),
            estado: estado.into(),
            proponente: "CONGRESO".into(),
            autores: autores.into(),
        })
    }

    fn sample() -> Vec<CleanRecord> {
        vec![
            rec("10/05/2024", "Ley de salud en Piura", "Ana Soto - PERU LIBRE, Luis Paz", "APROBADO"),
            rec("01/03/2024", "Ley de educación", "Luis Paz, Rosa Díaz - FP", "ARCHIVADO"),
            rec("", "Ley Misteriosa", "", "APROBADO"),
        ]
    }

    #[test]
    fn summary_counts_and_dates() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(summary.by_party.get("PERU LIBRE"), Some(&1));
        assert_eq!(summary.by_party.get("FUERZA POPULAR"), Some(&1));
        assert_eq!(summary.by_party.get("DESCONOCIDO"), Some(&1));
        assert_eq!(summary.by_category.get("SALUD"), Some(&1));
        assert_eq!(summary.by_category.get("EDUCACION"), Some(&1));
        assert_eq!(summary.by_category.get("OTROS"), Some(&1));
        assert_eq!(summary.by_region.get("PIURA"), Some(&1));
        assert_eq!(summary.by_region.len(), 1);
        assert_eq!(summary.by_state.get("APROBADO"), Some(&2));
        assert!((summary.average_authors - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.most_active_author, Some(("Luis Paz".to_string(), 2)));
    }

    #[test]
    fn author_ties_break_alphabetically() {
        let records = vec![rec("01/01/2024", "Ley", "Zoe Ruiz, Ana Soto", "APROBADO")];
        let top = top_authors(&records, 2);
        assert_eq!(top[0].0, "Ana Soto");
        assert_eq!(top[1].0, "Zoe Ruiz");
    }

    #[test]
    fn empty_dataset() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.first_date, None);
        assert_eq!(summary.average_authors, 0.0);
        assert_eq!(summary.most_active_author, None);
    }

    #[test]
    fn ranked_orders_by_count() {
        let counts = BTreeMap::from([("A".to_string(), 1), ("B".to_string(), 3)]);
        assert_eq!(ranked(&counts)[0], ("B".to_string(), 3));
    }
}
