use async_trait::async_trait;

use crate::error::ScraperError;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Launch and configure the browser session
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// Run the extraction against the live site
    async fn scrape(&mut self) -> Result<(), ScraperError>;

    /// Release browser resources
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// One-shot run (initialize → scrape → close)
    async fn execute(&mut self) -> Result<(), ScraperError> {
        self.initialize().await?;
        let result = self.scrape().await;
        self.close().await?;
        result
    }
}
