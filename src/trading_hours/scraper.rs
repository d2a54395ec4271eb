//! Trading-hours extraction

use std::path::PathBuf;

use scraper::{Html, Selector};
use tracing::info;

use crate::checkpoint::CheckpointStore;
use crate::error::ScraperError;

const SCHEDULE_URL: &str = "https://www.b3.com.br/pt_br/solucoes/plataformas/puma-trading-system/para-participantes-e-traders/horario-de-negociacao/acoes/";

/// The raw-table checkpoint file under the extraction root.
pub const TABLE_FILE: &str = "table.htm";

pub struct TradingHoursExtractor {
    client: reqwest::Client,
    store: CheckpointStore,
}

impl TradingHoursExtractor {
    pub fn new(extracted_data: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            store: CheckpointStore::new(extracted_data),
        }
    }

    pub fn table_path(&self) -> PathBuf {
        self.store.root().join(TABLE_FILE)
    }

    /// Fetch the page and cut out the schedule table.
    async fn fetch_table(&self) -> Result<String, ScraperError> {
        let response = self.client.get(SCHEDULE_URL).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                code: status.as_u16(),
                url: SCHEDULE_URL.to_string(),
            });
        }
        let html = response.text().await?;
        extract_table(&html).ok_or_else(|| {
            ScraperError::ElementNotFound("schedule table on the trading-hours page".to_string())
        })
    }

    /// Save the table HTML checkpoint. `update` forces a refresh of an
    /// existing checkpoint; without it the file on disk wins.
    pub async fn run(&self, update: bool) -> Result<(), ScraperError> {
        let path = self.table_path();
        if self.store.exists(&path) && !update {
            info!("Schedule table already on disk: {:?}", path);
            return Ok(());
        }
        let table = self.fetch_table().await?;
        self.store.save(&path, &table, update)?;
        info!("Schedule table saved: {:?}", path);
        Ok(())
    }
}

/// First `table.responsive` element of the page, as HTML.
fn extract_table(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("table.responsive").expect("static selector");
    document.select(&selector).next().map(|table| table.html())
}
