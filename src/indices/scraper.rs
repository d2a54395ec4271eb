//! Portfolio-composition downloads
//!
//! One browser visit per index: open the index day page, click the Download
//! link and poll the download directory until the CSV lands. Indices whose
//! CSV is already on disk are skipped entirely.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

const DAY_PAGE_URL: &str = "https://sistemaswebb3-listados.b3.com.br/indexPage/day";
const DOWNLOAD_WAIT_SECS: u64 = 30;
const LINK_WAIT_ROUNDS: u32 = 20;

pub struct IndicesScraper {
    config: ScraperConfig,
    indices: Vec<String>,
    browser: Option<Browser>,
    page: Option<Arc<Page>>,
}

impl IndicesScraper {
    pub fn new(config: ScraperConfig, indices: Vec<String>) -> Self {
        Self {
            config,
            indices,
            browser: None,
            page: None,
        }
    }

    fn get_page(&self) -> Result<&Arc<Page>, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("browser not initialized".into()))
    }

    /// Composition CSV already downloaded for this index?
    fn find_csv_for(&self, indice: &str) -> Option<PathBuf> {
        let download_dir = &self.config.extracted_data;
        if !download_dir.exists() {
            return None;
        }
        let needle = indice.to_ascii_lowercase();
        std::fs::read_dir(download_dir)
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

    /// Poll until the index's CSV is fully downloaded (no browser partials).
    async fn wait_for_download(&self, indice: &str) -> Result<PathBuf, ScraperError> {
        let timeout = Duration::from_secs(DOWNLOAD_WAIT_SECS);
        let poll_interval = Duration::from_millis(500);
        let start = std::time::Instant::now();

        loop {
            if let Some(path) = self.find_csv_for(indice) {
                let filename = path.file_name().unwrap_or_default().to_string_lossy();
                if !filename.ends_with(".crdownload") && !filename.ends_with(".tmp") {
                    info!("Composition CSV for {} detected: {:?}", indice, path);
                    return Ok(path);
                }
            }

            if start.elapsed() > timeout {
                return Err(ScraperError::Timeout(format!(
                    "download for {} did not finish within {}s",
                    indice, DOWNLOAD_WAIT_SECS
                )));
            }

            sleep(poll_interval).await;
        }
    }

    async fn download_index(&self, indice: &str) -> Result<PathBuf, ScraperError> {
        let page = self.get_page()?.clone();
        let url = format!("{}/{}?language=pt-br", DAY_PAGE_URL, indice);
        info!("Requesting composition of {}: {}", indice, url);

        page.goto(url.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        // The Download anchor renders late; poll for it, then click.
        let mut clicked = false;
        for i in 0..LINK_WAIT_ROUNDS {
            let result = page
                .evaluate(
                    r#"
                    (function() {
                        var links = document.querySelectorAll('a');
                        for (var i = 0; i < links.length; i++) {
                            if (links[i].textContent.trim() === 'Download') {
                                links[i].click();
                                return true;
                            }
                        }
                        return false;
                    })()
                    "#,
                )
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

            if result.into_value::<bool>().unwrap_or(false) {
                clicked = true;
                break;
            }
            if i % 5 == 0 {
                info!("Waiting for Download link of {}... ({}/{})", indice, i + 1, LINK_WAIT_ROUNDS);
            }
            sleep(Duration::from_millis(500)).await;
        }

        if !clicked {
            return Err(ScraperError::ElementNotFound(format!(
                "Download link on the {} day page",
                indice
            )));
        }

        self.wait_for_download(indice).await
    }
}

#[async_trait]
impl Scraper for IndicesScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Initializing browser for index downloads...");

        std::fs::create_dir_all(&self.config.extracted_data)?;
        let download_path = self
            .config
            .extracted_data
            .canonicalize()
            .unwrap_or_else(|_| self.config.extracted_data.clone());

        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1280, 800)
            .request_timeout(self.config.timeout)
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if !self.config.headless {
            builder = builder.with_head();
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

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // Route downloads into the extraction directory, keeping the
        // server-side filenames so presence checks can match on them.
        let download_params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_path.to_string_lossy().to_string())
            .events_enabled(true)
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("download setup: {}", e)))?;

        page.execute(download_params)
            .await
            .map_err(|e| ScraperError::BrowserInit(format!("download setup: {}", e)))?;

        self.browser = Some(browser);
        self.page = Some(Arc::new(page));

        info!("Browser initialized");
        Ok(())
    }

    async fn scrape(&mut self) -> Result<(), ScraperError> {
        for indice in self.indices.clone() {
            if let Some(existing) = self.find_csv_for(&indice) {
                info!("Composition of {} already on disk: {:?}", indice, existing);
                continue;
            }
            match self.download_index(&indice).await {
                Ok(path) => info!("Composition of {} saved: {:?}", indice, path),
                Err(e) if e.is_retryable() => {
                    // Leave the gap for a rerun; the presence check makes
                    // that rerun cheap.
                    warn!("Could not download composition of {}: {}", indice, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");
        self.page = None;
        self.browser = None;
        Ok(())
    }
}
