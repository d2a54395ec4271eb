//! Schedule-table reshaping
//!
//! The B3 table carries one visual column per session phase with an
//! Início/Fim sub-header row underneath. The flat CSV needs one column per
//! phase boundary, so every header except the market name is doubled, the
//! after-market group header is folded into its six trailing columns as a
//! prefix, and each doubled header is tagged with the upper-cased sub-header
//! it sits over.

use std::fs;
use std::path::Path;

use scraper::{Html, Selector};
use tracing::info;

use crate::error::ScraperError;

/// Group header of the after-market block, as printed on the page.
const AFTER_MARKET_HEADER: &str = "After-Market2";
/// Phase-boundary columns covered by the after-market block.
const AFTER_MARKET_COLUMNS: usize = 6;

/// Headers (non-empty `<th>` texts) and data rows (`<td>` rows) of the table.
pub fn read_table(html: &str) -> Result<(Vec<String>, Vec<Vec<String>>), ScraperError> {
    let document = Html::parse_fragment(html);
    let th = Selector::parse("th").expect("static selector");
    let tr = Selector::parse("tr").expect("static selector");
    let td = Selector::parse("td").expect("static selector");

    let headers: Vec<String> = document
        .select(&th)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    let rows: Vec<Vec<String>> = document
        .select(&tr)
        .skip(1)
        .map(|row| {
            row.select(&td)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect::<Vec<String>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    if headers.is_empty() || rows.is_empty() {
        return Err(ScraperError::Extraction(
            "schedule table has no headers or no rows".to_string(),
        ));
    }
    Ok((headers, rows))
}

/// Expand the visual headers into one column per phase boundary, tagged with
/// the Início/Fim sub-header row.
pub fn transform_headers(
    headers: &[String],
    sub_row: &[String],
) -> Result<Vec<String>, ScraperError> {
    // double every header except the market name; the after-market group
    // header disappears here and comes back as a prefix below
    let mut expanded: Vec<String> = vec![headers[0].clone()];
    for header in &headers[1..] {
        for _ in 0..2 {
            if header != AFTER_MARKET_HEADER {
                expanded.push(header.clone());
            }
        }
    }

    let total = expanded.len();
    if sub_row.len() != total {
        return Err(ScraperError::Extraction(format!(
            "schedule sub-header row has {} cells for {} columns",
            sub_row.len(),
            total
        )));
    }

    let prefixed: Vec<String> = expanded
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            if i >= total.saturating_sub(AFTER_MARKET_COLUMNS) {
                format!("{} {}", AFTER_MARKET_HEADER, header)
            } else {
                header
            }
        })
        .collect();

    Ok(prefixed
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            if i == 0 {
                header
            } else {
                format!("{} \"{}\"", header, sub_row[i].to_uppercase())
            }
        })
        .collect())
}

/// Read the checkpointed table and write the flat schedule CSV.
pub fn run(table_path: &Path, output_csv: &Path) -> Result<(), ScraperError> {
    let html = fs::read_to_string(table_path)?;
    let (headers, rows) = read_table(&html)?;
    let columns = transform_headers(&headers, &rows[0])?;

    let data = &rows[1..];
    if data.is_empty() {
        return Err(ScraperError::Extraction(
            "schedule table has no data rows".to_string(),
        ));
    }
    for row in data {
        if row.len() != columns.len() {
            return Err(ScraperError::Extraction(format!(
                "schedule row has {} cells for {} columns",
                row.len(),
                columns.len()
            )));
        }
    }

    if let Some(parent) = output_csv.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(output_csv)?;
    writer.write_record(&columns)?;
    for row in data {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!("Schedule written: {:?} ({} rows)", output_csv, data.len());
    Ok(())
}
