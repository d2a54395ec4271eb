//! Browser-backed listed-companies scraper
//!
//! Owns the Chrome session and runs both crawl phases against the live
//! listing, checkpointing as it goes.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

use super::audit;
use super::crawler::{CrawlSummary, Crawler, DetailSummary};
use super::page::B3ListingPage;
use super::types::ListedConfig;

pub struct ListedCompaniesScraper {
    config: ScraperConfig,
    listed: ListedConfig,
    browser: Option<Browser>,
    last_run: Option<(CrawlSummary, DetailSummary)>,
}

impl ListedCompaniesScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            listed: ListedConfig::default(),
            browser: None,
            last_run: None,
        }
    }

    pub fn with_listed_config(mut self, listed: ListedConfig) -> Self {
        self.listed = listed;
        self
    }

    pub fn store(&self) -> CheckpointStore {
        CheckpointStore::new(&self.config.extracted_data)
    }

    /// Counters from the most recent `scrape` run.
    pub fn last_run(&self) -> Option<&(CrawlSummary, DetailSummary)> {
        self.last_run.as_ref()
    }

    /// Full-page screenshot logged as a base64 data URL, debug mode only.
    async fn debug_screenshot(&self, page: &Page, label: &str) {
        if !self.config.debug {
            return;
        }
        match page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(shot) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&shot);
                debug!("{} screenshot: data:image/png;base64,{}", label, encoded);
            }
            Err(e) => debug!("Could not capture {} screenshot: {}", label, e),
        }
    }
}

#[async_trait]
impl Scraper for ListedCompaniesScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Initializing browser for the company listing crawl...");

        std::fs::create_dir_all(&self.config.extracted_data)?;

        // Unique profile directory so parallel runs never share state
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("b3-listed-{}", unique_id));

        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800)
            .request_timeout(self.config.timeout)
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        self.browser = Some(browser);
        info!("Browser initialized");
        Ok(())
    }

    async fn scrape(&mut self) -> Result<(), ScraperError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("browser not initialized".to_string()))?;

        let page = Arc::new(
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| ScraperError::BrowserInit(e.to_string()))?,
        );

        let store = self.store();
        let mut ui = B3ListingPage::new(page.clone(), self.listed.clone());

        if let Err(e) = ui.open_listing().await {
            self.debug_screenshot(&page, "listing").await;
            return Err(e);
        }

        let mut crawler = Crawler::new(&mut ui, &store, &self.listed);

        let links = match crawler.collect_links().await {
            Ok(summary) => summary,
            Err(e) => {
                self.debug_screenshot(&page, "link collection").await;
                return Err(e);
            }
        };

        let details = match crawler.collect_details().await {
            Ok(summary) => summary,
            Err(e) => {
                self.debug_screenshot(&page, "detail collection").await;
                return Err(e);
            }
        };

        // Post-hoc integrity pass over everything on disk
        let bad = audit::audit_records(&store);
        if !bad.is_empty() {
            warn!("{} records flagged by the audit: {:?}", bad.len(), bad);
        }

        info!(
            "Crawl finished: {} pages, {} links collected, {} records written",
            links.pages, links.visited, details.written
        );
        self.last_run = Some((links, details));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");
        self.browser = None;
        Ok(())
    }
}
