//! Checkpoint consolidation
//!
//! Reads every phase-2 checkpoint into one semicolon-delimited table. Codes
//! with no attribute checkpoint yet are left out; unreadable checkpoints are
//! skipped here and surfaced by the record audit.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::ScraperError;

use super::types::CompanyRecord;

pub const OUTPUT_FILE: &str = "todas_empresas_listadas.csv";

/// Write the consolidated table; returns its path and row count.
pub fn consolidate(
    store: &CheckpointStore,
    processed_dir: &Path,
) -> Result<(PathBuf, usize), ScraperError> {
    fs::create_dir_all(processed_dir)?;
    let csv_path = processed_dir.join(OUTPUT_FILE);

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(&csv_path)?;
    writer.write_record(CompanyRecord::CSV_HEADER)?;

    let mut rows = 0;
    for codigo in store.codes()? {
        if !store.exists(&store.infos_path(&codigo)) {
            debug!("No attribute checkpoint yet for {}", codigo);
            continue;
        }
        match store.load_record(&codigo) {
            Ok(record) => {
                writer.write_record(record.fields())?;
                rows += 1;
            }
            Err(e) => {
                warn!("Skipping unreadable checkpoint for {}: {}", codigo, e);
            }
        }
    }
    writer.flush()?;

    info!("Consolidated {} companies into {:?}", rows, csv_path);
    Ok((csv_path, rows))
}
