//! On-disk checkpoint store
//!
//! One directory per entry code under the extraction root. A file's
//! existence is the completion marker: work units whose checkpoint is
//! already present are never repeated.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ScraperError;
use crate::listed::types::CompanyRecord;

pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` at `path`, creating parent directories as needed.
    ///
    /// When the file already exists and `overwrite` is false this is a
    /// no-op, not an error; returns whether anything was written.
    pub fn save(&self, path: &Path, content: &str, overwrite: bool) -> Result<bool, ScraperError> {
        if path.exists() && !overwrite {
            debug!("checkpoint already present, skipping: {:?}", path);
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(true)
    }

    /// Sole completion check for a unit of crawl work.
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn read(&self, path: &Path) -> Result<String, ScraperError> {
        Ok(fs::read_to_string(path)?)
    }

    pub fn company_dir(&self, codigo: &str) -> PathBuf {
        self.root.join(codigo)
    }

    /// Phase-1 checkpoint: the entry's detail-page URL.
    pub fn url_path(&self, codigo: &str) -> PathBuf {
        self.company_dir(codigo).join(format!("url_{}.txt", codigo))
    }

    /// Phase-2 checkpoint: the extracted company record.
    pub fn infos_path(&self, codigo: &str) -> PathBuf {
        self.company_dir(codigo).join(format!("infos_{}.json", codigo))
    }

    pub fn save_url(&self, codigo: &str, url: &str) -> Result<bool, ScraperError> {
        self.save(&self.url_path(codigo), url, false)
    }

    pub fn load_url(&self, codigo: &str) -> Result<String, ScraperError> {
        Ok(self.read(&self.url_path(codigo))?.trim().to_string())
    }

    pub fn save_record(&self, record: &CompanyRecord) -> Result<bool, ScraperError> {
        let json = serde_json::to_string_pretty(record)?;
        self.save(&self.infos_path(&record.codigo), &json, false)
    }

    pub fn load_record(&self, codigo: &str) -> Result<CompanyRecord, ScraperError> {
        let json = self.read(&self.infos_path(codigo))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Entry codes with a checkpoint directory on disk, sorted.
    pub fn codes(&self) -> Result<Vec<String>, ScraperError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut codes: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        codes.sort();
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(codigo: &str) -> CompanyRecord {
        CompanyRecord {
            codigo: codigo.to_string(),
            nome_do_pregao: "PETROBRAS".to_string(),
            codigo_de_negociacao: "PETR3; PETR4".to_string(),
            cnpj: "33.000.167/0001-01".to_string(),
            atividade_principal: "Petróleo, gás e energia".to_string(),
            classificacao_setorial: "Petróleo, Gás e Biocombustíveis".to_string(),
            escriturador: "Banco Bradesco S/A".to_string(),
        }
    }

    #[test]
    fn test_save_skips_existing_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let path = store.url_path("PETR");

        assert!(store.save(&path, "https://example.com/a", false).unwrap());
        assert!(!store.save(&path, "https://example.com/b", false).unwrap());
        assert_eq!(store.load_url("PETR").unwrap(), "https://example.com/a");

        assert!(store.save(&path, "https://example.com/b", true).unwrap());
        assert_eq!(store.load_url("PETR").unwrap(), "https://example.com/b");
    }

    #[test]
    fn test_exists_is_the_completion_check() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        assert!(!store.exists(&store.url_path("VALE")));
        store.save_url("VALE", "https://example.com/vale").unwrap();
        assert!(store.exists(&store.url_path("VALE")));

        std::fs::remove_file(store.url_path("VALE")).unwrap();
        assert!(!store.exists(&store.url_path("VALE")));
    }

    #[test]
    fn test_record_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        let rec = record("PETR");
        assert!(store.save_record(&rec).unwrap());
        assert_eq!(store.load_record("PETR").unwrap(), rec);
    }

    #[test]
    fn test_codes_lists_directories_sorted() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());

        store.save_url("VALE3", "https://example.com/1").unwrap();
        store.save_url("ABEV3", "https://example.com/2").unwrap();
        // stray file at the root is not an entry
        std::fs::write(dir.path().join("notas.txt"), "x").unwrap();

        assert_eq!(store.codes().unwrap(), vec!["ABEV3", "VALE3"]);
    }

    #[test]
    fn test_codes_on_missing_root_is_empty() {
        let store = CheckpointStore::new("/nonexistent/checkpoint/root");
        assert!(store.codes().unwrap().is_empty());
    }
}
