//! Read client for the GitHub-hosted mirror
//!
//! Downstream consumers read the processed tables straight from the raw
//! GitHub mirror of this project's `processed_data` tree. Plain GETs only;
//! a non-200 answer or a transport failure is a domain error carrying the
//! URL, and there is no retry at this layer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScraperError;

const MIRROR_ROOT: &str =
    "https://raw.githubusercontent.com/rianlucascs/b3-scraping-project/master/processed_data";

// Percent-encoded directory names of the mirror tree
const SETORES_DIR: &str = "1.%20%C3%8Dndices%20de%20Segmentos%20e%20Setoriais/Setores";
const HORARIO_CSV: &str =
    "2.%20Hor%C3%A1rio%20de%20negocia%C3%A7%C3%A3o/Tabela_horarios_de_negociacao_no_mercado_de_acoes.csv";
const CODIGOS_PREFIX: &str = "C%C3%B3digos";
const APRESENTACAO_PREFIX: &str = "Apresenta%C3%A7%C3%A3o";

/// A parsed mirror table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Cell at (`row`, column `name`), if both exist.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }
}

/// Spot-market session boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketHours {
    pub inicio: String,
    pub fim: String,
}

async fn fetch(url: &str) -> Result<String, ScraperError> {
    debug!("GET {}", url);
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::Status {
            code: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

fn parse_table(text: &str) -> Result<Table, ScraperError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(Table { headers, rows })
}

/// Entry codes of one sector index.
pub async fn get_codigos(setor: &str) -> Result<Vec<String>, ScraperError> {
    let url = format!(
        "{}/{}/{}/{}_{}.txt",
        MIRROR_ROOT, SETORES_DIR, setor, CODIGOS_PREFIX, setor
    );
    let body = fetch(&url).await?;
    Ok(body
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Description text of one sector index.
pub async fn get_apresentacao(setor: &str) -> Result<String, ScraperError> {
    let url = format!(
        "{}/{}/{}/{}_{}.txt",
        MIRROR_ROOT, SETORES_DIR, setor, APRESENTACAO_PREFIX, setor
    );
    fetch(&url).await
}

/// Composition table of one sector index.
pub async fn get_tabela_setor(setor: &str) -> Result<Table, ScraperError> {
    let url = format!("{}/{}/{}/Tabela_{}.csv", MIRROR_ROOT, SETORES_DIR, setor, setor);
    parse_table(&fetch(&url).await?)
}

/// The full trading-hours schedule.
pub async fn get_tabela_horario() -> Result<Table, ScraperError> {
    let url = format!("{}/{}", MIRROR_ROOT, HORARIO_CSV);
    parse_table(&fetch(&url).await?)
}

/// Open and close of the spot market, straight off the schedule table.
pub async fn horario_mercado_a_vista() -> Result<MarketHours, ScraperError> {
    let table = get_tabela_horario().await?;
    extract_market_hours(&table)
}

fn extract_market_hours(table: &Table) -> Result<MarketHours, ScraperError> {
    let market_col = table.column("Mercado1").ok_or_else(|| {
        ScraperError::Extraction("schedule table lacks the Mercado1 column".to_string())
    })?;
    let row = table
        .rows
        .iter()
        .position(|row| row.get(market_col).map(|s| s.as_str()) == Some("Mercado a vista"))
        .ok_or_else(|| {
            ScraperError::Extraction("schedule table lacks the spot-market row".to_string())
        })?;

    let inicio = table.cell(row, "Negociação \"INÍCIO\"").ok_or_else(|| {
        ScraperError::Extraction("schedule table lacks the session-start column".to_string())
    })?;
    let fim = table.cell(row, "Negociação \"FIM\"").ok_or_else(|| {
        ScraperError::Extraction("schedule table lacks the session-end column".to_string())
    })?;

    Ok(MarketHours {
        inicio: inicio.to_string(),
        fim: fim.to_string(),
    })
}

/// Rewrite a github.com blob URL into its raw-content equivalent.
pub fn raw_github_url(url: &str) -> String {
    url.replace("https://github.com/", "https://raw.githubusercontent.com/")
        .replace("/blob", "")
}
