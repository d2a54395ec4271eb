use b3_scraper::indices::{self, transform, IndicesScraper, InfoExtractor};
use b3_scraper::{Scraper, ScraperConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,b3_scraper=debug")
        .init();

    let extracted =
        std::env::var("B3_EXTRACTED_DATA").unwrap_or_else(|_| "./extracted_data".to_string());
    let processed =
        std::env::var("B3_PROCESSED_DATA").unwrap_or_else(|_| "./processed_data".to_string());

    let config = ScraperConfig::new(&extracted, &processed);
    let codes = indices::index_codes();

    println!("=== Portfolio compositions ({} indices) ===", codes.len());
    let mut scraper = IndicesScraper::new(config.clone(), codes.clone());
    if let Err(e) = scraper.execute().await {
        eprintln!("Composition download failed: {}", e);
    }

    println!("=== Index descriptions ===");
    let extractor = InfoExtractor::new(&extracted);
    match extractor.run().await {
        Ok(saved) => println!("{} descriptions saved", saved),
        Err(e) => eprintln!("Description harvest failed: {}", e),
    }

    println!("=== Transform ===");
    match transform::run(config.extracted_data.as_path(), config.processed_data.as_path(), &codes) {
        Ok(written) => println!("{} indices processed", written),
        Err(e) => eprintln!("Transform failed: {}", e),
    }
}
