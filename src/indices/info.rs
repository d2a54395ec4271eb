//! Index description pages
//!
//! Harvests the "saiba mais" links from the sector-indices landing page and
//! saves each index's description panel as an HTML checkpoint.

use std::path::PathBuf;

use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::ScraperError;

const LANDING_URL: &str =
    "https://www.b3.com.br/pt_br/market-data-e-indices/indices/indices-de-segmentos-e-setoriais/";
const SITE_ROOT: &str = "https://www.b3.com.br/";

pub struct InfoExtractor {
    client: reqwest::Client,
    store: CheckpointStore,
}

impl InfoExtractor {
    pub fn new(extracted_data: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            store: CheckpointStore::new(extracted_data),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Detail-page links on the landing page, rewritten to absolute URLs.
    pub async fn get_links(&self) -> Result<Vec<String>, ScraperError> {
        let html = self.fetch(LANDING_URL).await?;
        info!("Connected to the sector-indices landing page");
        Ok(extract_links(&html))
    }

    /// Fetch every description page and checkpoint its info panel.
    pub async fn run(&self) -> Result<usize, ScraperError> {
        let mut saved = 0;
        for url in self.get_links().await? {
            let name = match url.rsplit('/').find(|part| !part.is_empty()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let path = self.store.root().join(format!("info_{}", name));
            if self.store.exists(&path) {
                info!("Description already on disk: {:?}", path);
                continue;
            }

            match self.fetch(&url).await {
                Ok(html) => {
                    let panel = extract_panels(&html);
                    if panel.is_empty() {
                        warn!("No description panel found at {}", url);
                        continue;
                    }
                    self.store.save(&path, &panel, false)?;
                    info!("Description saved: {:?}", path);
                    saved += 1;
                }
                Err(e) => {
                    // one broken page does not stop the harvest
                    warn!("Could not fetch {}: {}", url, e);
                }
            }
        }
        Ok(saved)
    }
}

/// Anchors advertising an index description ("saiba mais sobre ..."),
/// with the site-relative prefix rewritten.
fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").expect("static selector");

    document
        .select(&anchor)
        .filter(|a| a.html().to_lowercase().contains("saiba mais sobre"))
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.replace("../../../../", SITE_ROOT))
        .collect()
}

/// The description panel content: `#panel3a` when present, `#panel1a`
/// otherwise.
fn extract_panels(html: &str) -> String {
    let document = Html::parse_document(html);
    for id in ["#panel3a", "#panel1a"] {
        let selector = Selector::parse(id).expect("static selector");
        let joined: String = document.select(&selector).map(|el| el.html()).collect();
        if !joined.is_empty() {
            return joined;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_rewrites_relative_prefix() {
        let html = r#"
            <html><body>
              <a href="../../../../pt_br/indices/idiv.htm" title="Saiba mais sobre o IDIV">IDIV</a>
              <a href="https://www.b3.com.br/outra">outra coisa</a>
              <a href="../../../../pt_br/indices/smll.htm">Saiba mais sobre o SMLL</a>
            </body></html>
        "#;
        let links = extract_links(html);
        assert_eq!(
            links,
            vec![
                "https://www.b3.com.br/pt_br/indices/idiv.htm",
                "https://www.b3.com.br/pt_br/indices/smll.htm",
            ]
        );
    }

    #[test]
    fn test_extract_panels_prefers_panel3a() {
        let html = r#"
            <div id="panel1a"><p>resumo</p></div>
            <div id="panel3a"><p>descrição completa</p></div>
        "#;
        let panel = extract_panels(html);
        assert!(panel.contains("descrição completa"));
        assert!(!panel.contains("resumo"));
    }

    #[test]
    fn test_extract_panels_falls_back_to_panel1a() {
        let html = r#"<div id="panel1a"><p>resumo</p></div>"#;
        assert!(extract_panels(html).contains("resumo"));
        assert_eq!(extract_panels("<div>nada</div>"), "");
    }
}
