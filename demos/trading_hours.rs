use b3_scraper::trading_hours::{self, transform, TradingHoursExtractor};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,b3_scraper=debug")
        .init();

    let extracted =
        std::env::var("B3_EXTRACTED_DATA").unwrap_or_else(|_| "./extracted_data".to_string());
    let processed =
        std::env::var("B3_PROCESSED_DATA").unwrap_or_else(|_| "./processed_data".to_string());
    let update = std::env::var("B3_UPDATE").map(|v| v == "1").unwrap_or(false);

    let extractor = TradingHoursExtractor::new(&extracted);

    println!("=== Trading-hours schedule ===");
    if let Err(e) = extractor.run(update).await {
        eprintln!("Extraction failed: {}", e);
        return;
    }

    let output = std::path::Path::new(&processed).join(trading_hours::OUTPUT_FILE);
    match transform::run(&extractor.table_path(), &output) {
        Ok(()) => println!("Schedule written to {:?}", output),
        Err(e) => eprintln!("Transform failed: {}", e),
    }
}
