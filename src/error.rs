use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser initialization failed: {0}")]
    BrowserInit(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("JavaScript evaluation failed: {0}")]
    JavaScript(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("page drift: expected page {expected}, UI displays page {displayed}")]
    PageDrift { expected: u32, displayed: u32 },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {code} for {url}")]
    Status { code: u16, url: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file I/O error: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ScraperError {
    /// Transient failures worth another attempt inside a bounded retry loop.
    /// Data-shape and setup failures are not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScraperError::Navigation(_)
                | ScraperError::JavaScript(_)
                | ScraperError::ElementNotFound(_)
                | ScraperError::Timeout(_)
                | ScraperError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ScraperError::Timeout("grid".into()).is_retryable());
        assert!(ScraperError::ElementNotFound("card".into()).is_retryable());
        assert!(!ScraperError::BrowserInit("no chrome".into()).is_retryable());
        assert!(!ScraperError::PageDrift {
            expected: 3,
            displayed: 5
        }
        .is_retryable());
    }

    #[test]
    fn test_page_drift_message_names_both_pages() {
        let err = ScraperError::PageDrift {
            expected: 4,
            displayed: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains('4') && msg.contains('1'));
    }
}
