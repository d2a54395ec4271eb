//! Listed-companies crawler
//!
//! Drives the paginated listing at sistemaswebb3-listados.b3.com.br, collects
//! each company's detail-page URL (phase 1), later visits the recorded URLs
//! to read the company attributes (phase 2), and consolidates the checkpoints
//! into a single semicolon-delimited table.

pub mod audit;
pub mod crawler;
pub mod page;
pub mod scraper;
pub mod transform;
pub mod types;

pub use crawler::{Crawler, CrawlSummary, DetailSummary};
pub use page::{B3ListingPage, ListingPage};
pub use scraper::ListedCompaniesScraper;
pub use types::{CompanyRecord, ListedConfig};
