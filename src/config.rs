use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub extracted_data: PathBuf,
    pub processed_data: PathBuf,
    pub headless: bool,
    pub debug: bool,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            extracted_data: PathBuf::from("./extracted_data"),
            processed_data: PathBuf::from("./processed_data"),
            headless: true,
            debug: false,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ScraperConfig {
    pub fn new(extracted_data: impl Into<PathBuf>, processed_data: impl Into<PathBuf>) -> Self {
        Self {
            extracted_data: extracted_data.into(),
            processed_data: processed_data.into(),
            ..Default::default()
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScraperConfig::new("/tmp/extracted", "/tmp/processed")
            .with_headless(false)
            .with_debug(true)
            .with_timeout(Duration::from_secs(120));

        assert_eq!(config.extracted_data, PathBuf::from("/tmp/extracted"));
        assert_eq!(config.processed_data, PathBuf::from("/tmp/processed"));
        assert!(!config.headless);
        assert!(config.debug);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_defaults() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert!(!config.debug);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
