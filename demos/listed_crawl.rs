use b3_scraper::{CrawlRequest, CrawlService};
use tower::Service;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,b3_scraper=debug")
        .init();

    let extracted =
        std::env::var("B3_EXTRACTED_DATA").unwrap_or_else(|_| "./extracted_data".to_string());
    let processed =
        std::env::var("B3_PROCESSED_DATA").unwrap_or_else(|_| "./processed_data".to_string());
    let headless = std::env::var("B3_HEADLESS").map(|v| v != "0").unwrap_or(true);

    let mut service = CrawlService::new();
    let request = CrawlRequest::new(extracted, processed).with_headless(headless);

    println!("=== Listed-companies crawl ===");
    match service.call(request).await {
        Ok(result) => {
            println!("OK: {} companies -> {:?}", result.companies, result.csv_path);
        }
        Err(e) => {
            eprintln!("Crawl failed: {}", e);
        }
    }
}
