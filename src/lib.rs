//! B3 reference-data scrapers
//!
//! - Crawl the listed-companies listing and consolidate company records
//! - Download sector-index portfolio compositions and descriptions
//! - Extract the equity trading-hours schedule
//! - Read the processed tables back from the GitHub mirror
//!
//! # Listed-companies crawl
//!
//! ```rust,ignore
//! use b3_scraper::{CrawlRequest, CrawlService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = CrawlService::new();
//!
//!     let request = CrawlRequest::new("./extracted_data", "./processed_data")
//!         .with_headless(true);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("Companies: {} -> {:?}", result.companies, result.csv_path);
//! }
//! ```
//!
//! # Mirror read client
//!
//! ```rust,ignore
//! use b3_scraper::mirror;
//!
//! #[tokio::main]
//! async fn main() {
//!     let codigos = mirror::get_codigos("IDIV").await.unwrap();
//!     let horario = mirror::horario_mercado_a_vista().await.unwrap();
//!     println!("{} códigos, pregão {}-{}", codigos.len(), horario.inicio, horario.fim);
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod indices;
pub mod listed;
pub mod mirror;
pub mod service;
pub mod trading_hours;
pub mod traits;

// Main types re-exported
pub use checkpoint::CheckpointStore;
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use service::{CrawlRequest, CrawlResult, CrawlService};
pub use traits::Scraper;

// Per-target scrapers
pub use indices::{IndicesScraper, InfoExtractor};
pub use listed::{CompanyRecord, ListedCompaniesScraper, ListedConfig};
pub use mirror::MarketHours;
pub use trading_hours::TradingHoursExtractor;
