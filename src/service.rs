use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::Service;
use tracing::info;

use crate::checkpoint::CheckpointStore;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::listed::{transform, ListedCompaniesScraper};
use crate::traits::Scraper;

/// One full listed-companies run: both crawl phases plus consolidation.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub extracted_data: PathBuf,
    pub processed_data: PathBuf,
    pub headless: bool,
}

impl CrawlRequest {
    pub fn new(extracted_data: impl Into<PathBuf>, processed_data: impl Into<PathBuf>) -> Self {
        Self {
            extracted_data: extracted_data.into(),
            processed_data: processed_data.into(),
            headless: true,
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

impl From<CrawlRequest> for ScraperConfig {
    fn from(req: CrawlRequest) -> Self {
        ScraperConfig {
            extracted_data: req.extracted_data,
            processed_data: req.processed_data,
            headless: req.headless,
            debug: false,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Crawl outcome.
#[derive(Debug)]
pub struct CrawlResult {
    pub csv_path: PathBuf,
    pub companies: usize,
}

/// tower::Service running the whole listed-companies pipeline per call.
#[derive(Debug, Clone, Default)]
pub struct CrawlService {
    // room for rate limiting / caching later
}

impl CrawlService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<CrawlRequest> for CrawlService {
    type Response = CrawlResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!("Crawl requested: extracted={:?}", req.extracted_data);

        Box::pin(async move {
            let config: ScraperConfig = req.into();

            let mut scraper = ListedCompaniesScraper::new(config.clone());
            scraper.execute().await?;

            let store = CheckpointStore::new(&config.extracted_data);
            let (csv_path, companies) = transform::consolidate(&store, &config.processed_data)?;

            info!(
                "Crawl finished: {} companies consolidated into {:?}",
                companies, csv_path
            );

            Ok(CrawlResult {
                csv_path,
                companies,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_request_builder() {
        let req = CrawlRequest::new("/tmp/ext", "/tmp/proc").with_headless(false);
        assert_eq!(req.extracted_data, PathBuf::from("/tmp/ext"));
        assert_eq!(req.processed_data, PathBuf::from("/tmp/proc"));
        assert!(!req.headless);
    }

    #[test]
    fn test_crawl_request_to_config() {
        let req = CrawlRequest::new("/tmp/ext", "/tmp/proc");
        let config: ScraperConfig = req.into();
        assert_eq!(config.extracted_data, PathBuf::from("/tmp/ext"));
        assert!(config.headless);
        assert!(!config.debug);
    }
}
