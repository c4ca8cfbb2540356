//! Result-table parsing: rendered page HTML to raw records.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use spley_portal::selectors::{RESULT_COLUMNS, RESULT_ROWS_CSS};

use crate::record::RawRecord;

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(RESULT_ROWS_CSS).unwrap());
static ELLIPSIS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.ellipsis").unwrap());
static LIST_ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

/// Parses every result row of a page snapshot, skipping malformed rows.
pub fn extract_rows(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    for (index, row) in document.select(&ROW_SELECTOR).enumerate() {
        match extract_row(row) {
            Some(record) => records.push(record),
            None => tracing::debug!("Skipping row {}: fewer than {} cells", index + 1, RESULT_COLUMNS),
        }
    }
    records
}

/// One `<tr>` to a raw record; `None` when the row has too few cells.
pub fn extract_row(row: ElementRef<'_>) -> Option<RawRecord> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();
    if cells.len() < RESULT_COLUMNS {
        return None;
    }

    Some(RawRecord {
        proyecto: cell_text(cells[0]),
        fecha: cell_text(cells[1]),
        titulo: cell_text(cells[2]),
        estado: cell_text(cells[3]),
        proponente: cell_text(cells[4]),
        autores: authors_text(cells[5]),
    })
}

/// Full text of a cell, preferring the untruncated ellipsis wrapper.
fn cell_text(cell: ElementRef<'_>) -> String {
    match cell.select(&ELLIPSIS_SELECTOR).next() {
        Some(span) => stripped_text(span),
        None => stripped_text(cell),
    }
}

/// Author list items joined with `", "`, or the plain cell text.
fn authors_text(cell: ElementRef<'_>) -> String {
    let items: Vec<String> = cell
        .select(&LIST_ITEM_SELECTOR)
        .map(stripped_text)
        .filter(|t| !t.is_empty())
        .collect();
    if items.is_empty() {
        stripped_text(cell)
    } else {
        items.join(", ")
    }
}

// Rendered text with whitespace runs collapsed; inline tags keep their spacing.
fn stripped_text(el: ElementRef<'_>) -> String {
    let joined: String = el.text().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
