//! Completeness auditing
//!
//! Fire-and-forget diagnostics: gaps between what a page showed and what is
//! checkpointed on disk, and phase-2 records that do not parse or carry the
//! wrong code, are written out as sidecar files. Nothing here ever fails a
//! crawl.

use chrono::{offset::FixedOffset, Utc};
use tracing::{error, warn};

use crate::checkpoint::CheckpointStore;

/// America/São Paulo, without DST (B3 local time).
fn timestamp() -> String {
    let brt = FixedOffset::west_opt(3 * 3600).expect("fixed offset");
    Utc::now()
        .with_timezone(&brt)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Compare the codes a listing page reported against the checkpoints on
/// disk; any gap is written to `erros/pagina_<n>.txt` under the store root.
pub fn audit_page(store: &CheckpointStore, page: u32, expected: &[String]) {
    let missing: Vec<&String> = expected
        .iter()
        .filter(|codigo| !store.exists(&store.url_path(codigo)))
        .collect();
    if missing.is_empty() {
        return;
    }

    warn!(
        "Page {}: {} of {} codes have no checkpoint",
        page,
        missing.len(),
        expected.len()
    );

    let mut content = format!("{} - pagina {} sem checkpoint:\n", timestamp(), page);
    for codigo in &missing {
        content.push_str(codigo);
        content.push('\n');
    }

    let path = store.root().join("erros").join(format!("pagina_{}.txt", page));
    if let Err(e) = store.save(&path, &content, true) {
        error!("Could not write audit file {:?}: {}", path, e);
    }
}

/// Post-hoc record audit: a phase-2 checkpoint that fails to parse, or whose
/// embedded code differs from its directory name, gets a sidecar
/// `erro_<codigo>.txt` next to it. Returns the offending codes.
pub fn audit_records(store: &CheckpointStore) -> Vec<String> {
    let codes = match store.codes() {
        Ok(codes) => codes,
        Err(e) => {
            error!("Could not enumerate checkpoints for auditing: {}", e);
            return Vec::new();
        }
    };

    let mut bad = Vec::new();
    for codigo in codes {
        if !store.exists(&store.infos_path(&codigo)) {
            continue;
        }
        let reason = match store.load_record(&codigo) {
            Ok(record) if record.codigo != codigo => Some(format!(
                "registro declara codigo {:?}, diretorio e {:?}",
                record.codigo, codigo
            )),
            Ok(_) => None,
            Err(e) => Some(format!("registro ilegivel: {}", e)),
        };

        if let Some(reason) = reason {
            warn!("Record audit failed for {}: {}", codigo, reason);
            let path = store.company_dir(&codigo).join(format!("erro_{}.txt", codigo));
            let content = format!("{} - {}\n", timestamp(), reason);
            if let Err(e) = store.save(&path, &content, true) {
                error!("Could not write audit file {:?}: {}", path, e);
            }
            bad.push(codigo);
        }
    }
    bad
}
