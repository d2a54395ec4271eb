//! Composition-CSV normalization
//!
//! B3 ships the portfolio composition as a Latin-1, semicolon-delimited CSV
//! with a title line on top and two totals lines at the bottom. This pass
//! strips the wrapping, then writes the per-index code list and table under
//! `Setores/<indice>/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::ScraperError;

pub const COLUMNS: [&str; 5] = ["Código", "Ação", "Tipo", "Qtde. Teórica", "Part. (%)"];

/// The downloaded composition CSV for `indice`, if any.
pub fn locate_csv(dir: &Path, indice: &str) -> Option<PathBuf> {
    let needle = indice.to_ascii_lowercase();
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            let name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_ascii_lowercase();
            name.contains(&needle) && name.ends_with(".csv")
        })
}

/// Latin-1 bytes map one-to-one onto the first 256 code points.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Data rows of a composition CSV: title line and header skipped, the two
/// totals lines at the bottom dropped, every row padded to the column count.
pub fn parse_composition(text: &str) -> Result<Vec<Vec<String>>, ScraperError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(|field| field.trim().to_string()).collect());
    }

    // title line + header line on top, totals + reductor at the bottom
    if records.len() < 4 {
        return Err(ScraperError::Extraction(
            "composition CSV shorter than its framing".to_string(),
        ));
    }
    let body = &records[2..records.len() - 2];

    Ok(body
        .iter()
        .map(|row| {
            let mut row: Vec<String> = row.clone();
            row.resize(COLUMNS.len(), String::new());
            row
        })
        .filter(|row| !row[0].is_empty())
        .collect())
}

/// Process every index with a downloaded CSV; returns how many were written.
pub fn run(
    extracted_data: &Path,
    processed_data: &Path,
    indices: &[String],
) -> Result<usize, ScraperError> {
    let store = CheckpointStore::new(processed_data);
    let mut written = 0;

    for indice in indices {
        let Some(csv_path) = locate_csv(extracted_data, indice) else {
            warn!("No composition CSV on disk for {}", indice);
            continue;
        };

        let text = decode_latin1(&fs::read(&csv_path)?);
        let rows = match parse_composition(&text) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Composition of {} unreadable: {}", indice, e);
                continue;
            }
        };

        let sector_dir = processed_data.join("Setores").join(indice);
        fs::create_dir_all(&sector_dir)?;

        // one code per line, like the mirror serves it
        let codes: String = rows
            .iter()
            .map(|row| row[0].as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let codes_path = sector_dir.join(format!("Códigos_{}.txt", indice));
        store.save(&codes_path, &codes, false)?;

        let table_path = sector_dir.join(format!("Tabela_{}.csv", indice));
        if !table_path.exists() {
            let mut writer = csv::Writer::from_path(&table_path)?;
            writer.write_record(COLUMNS)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }

        info!("Processed composition of {}: {} rows", indice, rows.len());
        written += 1;
    }
    Ok(written)
}
