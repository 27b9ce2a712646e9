use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;

use crate::{config::RowPolicy, record::AntibiogramRecord, Error, Result, TABLE_CAPTION};

/// Parses a BioSample page off the async runtime and returns its antibiogram rows.
/// A page without an antibiogram table yields an empty `Vec`.
pub async fn parse_page(html: String, policy: RowPolicy) -> Result<Vec<AntibiogramRecord>> {
    spawn_blocking(move || extract_antibiogram(&html, policy)).await?
}

/// Finds the `<table>` captioned "Antibiogram" and turns every row that has `<td>` cells
/// into a record keyed by the normalized `<th>` texts.
pub fn extract_antibiogram(html: &str, policy: RowPolicy) -> Result<Vec<AntibiogramRecord>> {
    let doc = Html::parse_document(html);

    let table_selector = create_selector("table")?;
    let header_selector = create_selector("th")?;
    let row_selector = create_selector("tr")?;

    let Some(table) = doc.select(&table_selector).find(is_antibiogram) else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = table
        .select(&header_selector)
        .filter(|th| belongs_to(th, &table))
        .map(|th| normalize_header(&th.text().collect::<String>()))
        .collect();

    let mut records = Vec::new();
    for row in table.select(&row_selector).filter(|tr| belongs_to(tr, &table)) {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .map(|td| td.text().collect::<String>())
            .collect();
        // Header rows only carry <th>.
        if cells.is_empty() {
            continue;
        }
        records.push(zip_row(&headers, cells, policy));
    }
    Ok(records)
}

/// Replaces spaces with `_` and lowercases, e.g. `"Resistance phenotype"` -> `"resistance_phenotype"`.
#[inline]
pub fn normalize_header(value: &str) -> String {
    value.replace(' ', "_").to_lowercase()
}

fn zip_row(headers: &[String], cells: Vec<String>, policy: RowPolicy) -> AntibiogramRecord {
    let mut cells = cells.into_iter();
    let mut record = AntibiogramRecord::new();
    for header in headers {
        match (cells.next(), policy) {
            (Some(cell), _) => record.insert(header.as_str(), cell),
            (None, RowPolicy::Pad) => record.insert(header.as_str(), ""),
            (None, RowPolicy::Truncate) => break,
        }
    }
    record
}

fn is_antibiogram(table: &ElementRef) -> bool {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "caption")
        .any(|caption| caption.text().collect::<String>() == TABLE_CAPTION)
}

/// True when the closest enclosing `<table>` of `el` is `table`, so nested tables are skipped.
fn belongs_to(el: &ElementRef, table: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|anc| anc.value().name() == "table")
        .is_some_and(|owner| owner.id() == table.id())
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}
