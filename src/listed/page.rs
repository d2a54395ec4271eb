//! Listing-page access
//!
//! [`ListingPage`] is the seam between the crawl logic and the live UI:
//! the crawler only ever talks to this trait, the Chrome-backed
//! [`B3ListingPage`] implements it against the real listing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::ScraperError;

use super::types::{CompanyRecord, ListedConfig};

#[async_trait]
pub trait ListingPage: Send {
    /// Page number the pagination widget currently displays.
    async fn displayed_page(&mut self) -> Result<u32, ScraperError>;

    /// Total page count reported by the pagination widget.
    async fn total_pages(&mut self) -> Result<u32, ScraperError>;

    /// Click "next page".
    async fn advance(&mut self) -> Result<(), ScraperError>;

    /// Entry codes visible on the current page. The UI may render a card
    /// more than once; callers deduplicate.
    async fn visible_codes(&mut self) -> Result<Vec<String>, ScraperError>;

    /// Open the detail view for `codigo`, capture its URL and return to the
    /// listing. Returning resets the listing UI to page 1.
    async fn open_detail(&mut self, codigo: &str) -> Result<String, ScraperError>;

    /// Navigate to a recorded detail URL and read the company fields.
    /// Fields the page does not show come back as empty strings.
    async fn read_detail(&mut self, codigo: &str, url: &str)
        -> Result<CompanyRecord, ScraperError>;
}

/// Field set read off a company detail page. Every field is optional on the
/// page; absent ones deserialize to empty strings.
#[derive(Debug, Default, Deserialize)]
struct DetailFields {
    #[serde(default)]
    nome_do_pregao: String,
    #[serde(default)]
    codigo_de_negociacao: String,
    #[serde(default)]
    cnpj: String,
    #[serde(default)]
    atividade_principal: String,
    #[serde(default)]
    classificacao_setorial: String,
    #[serde(default)]
    escriturador: String,
}

/// Chrome-backed listing page.
pub struct B3ListingPage {
    page: Arc<Page>,
    config: ListedConfig,
}

impl B3ListingPage {
    pub fn new(page: Arc<Page>, config: ListedConfig) -> Self {
        Self { page, config }
    }

    /// Navigate to the listing entry point and wait for the cards to render.
    pub async fn open_listing(&mut self) -> Result<(), ScraperError> {
        info!("Opening company listing: {}", self.config.listing_url);
        self.page
            .goto(self.config.listing_url.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.wait_for_cards().await
    }

    async fn eval_string(&self, script: &str) -> Result<String, ScraperError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(result.into_value::<String>().unwrap_or_default())
    }

    async fn eval_bool(&self, script: &str) -> Result<bool, ScraperError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    /// Bounded poll until at least one company card is rendered.
    async fn wait_for_cards(&self) -> Result<(), ScraperError> {
        for i in 0..self.config.max_poll_rounds {
            let rendered = self
                .eval_bool("document.querySelectorAll('.card-title2').length > 0")
                .await?;
            if rendered {
                debug!("Listing cards rendered");
                return Ok(());
            }
            if i % 5 == 0 {
                info!(
                    "Waiting for listing cards... ({}/{})",
                    i + 1,
                    self.config.max_poll_rounds
                );
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
        Err(ScraperError::Timeout(
            "listing cards did not render".to_string(),
        ))
    }

    /// Bounded poll until the browser URL moves off the listing page.
    async fn wait_for_detail_url(&self) -> Result<String, ScraperError> {
        for _ in 0..self.config.max_poll_rounds {
            let url = self.eval_string("window.location.href").await?;
            if !url.is_empty() && !url.contains("listedCompaniesPage") {
                return Ok(url);
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
        Err(ScraperError::Timeout(
            "detail page URL did not appear".to_string(),
        ))
    }

    /// Entry codes are plain tickers; strip anything that is not, so they
    /// can be spliced into selector scripts.
    fn sanitize_code(codigo: &str) -> String {
        codigo
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}

#[async_trait]
impl ListingPage for B3ListingPage {
    async fn displayed_page(&mut self) -> Result<u32, ScraperError> {
        let text = self
            .eval_string(
                r#"
                (function() {
                    var current = document.querySelector('#listing_pagination li.current');
                    if (!current) return '';
                    var m = current.textContent.match(/\d+/);
                    return m ? m[0] : '';
                })()
                "#,
            )
            .await?;
        text.parse::<u32>().map_err(|_| {
            ScraperError::Extraction(format!("pagination current-page indicator unreadable: {:?}", text))
        })
    }

    async fn total_pages(&mut self) -> Result<u32, ScraperError> {
        let text = self
            .eval_string(
                r#"
                (function() {
                    var items = document.querySelectorAll('#listing_pagination li');
                    var max = 0;
                    for (var i = 0; i < items.length; i++) {
                        var m = items[i].textContent.match(/\d+/);
                        if (m) max = Math.max(max, parseInt(m[0], 10));
                    }
                    return String(max);
                })()
                "#,
            )
            .await?;
        match text.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ScraperError::Extraction(
                "pagination widget reports no pages".to_string(),
            )),
        }
    }

    async fn advance(&mut self) -> Result<(), ScraperError> {
        let clicked = self
            .eval_bool(
                r#"
                (function() {
                    var next = document.querySelector('#listing_pagination li.pagination-next a');
                    if (next) { next.click(); return true; }
                    return false;
                })()
                "#,
            )
            .await?;
        if !clicked {
            return Err(ScraperError::ElementNotFound(
                "pagination next-page link".to_string(),
            ));
        }
        sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        self.wait_for_cards().await
    }

    async fn visible_codes(&mut self) -> Result<Vec<String>, ScraperError> {
        let joined = self
            .eval_string(
                r#"
                (function() {
                    var cards = document.querySelectorAll('.card-title2');
                    var out = [];
                    for (var i = 0; i < cards.length; i++) {
                        out.push(cards[i].textContent.trim());
                    }
                    return out.join('\n');
                })()
                "#,
            )
            .await?;
        Ok(joined
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn open_detail(&mut self, codigo: &str) -> Result<String, ScraperError> {
        let code = Self::sanitize_code(codigo);
        let clicked = self
            .eval_bool(&format!(
                r#"
                (function() {{
                    var cards = document.querySelectorAll('.card-title2');
                    for (var i = 0; i < cards.length; i++) {{
                        if (cards[i].textContent.trim() === '{code}') {{
                            var card = cards[i].closest('.card') || cards[i];
                            card.click();
                            return true;
                        }}
                    }}
                    return false;
                }})()
                "#
            ))
            .await?;
        if !clicked {
            return Err(ScraperError::ElementNotFound(format!(
                "listing card for {}",
                codigo
            )));
        }

        let url = self.wait_for_detail_url().await?;
        debug!("Detail URL for {}: {}", codigo, url);

        // The listing is a single-page app: going back lands on page 1 and
        // the caller re-syncs to wherever it was.
        self.page
            .evaluate("history.back()")
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        self.wait_for_cards().await?;

        Ok(url)
    }

    async fn read_detail(
        &mut self,
        codigo: &str,
        url: &str,
    ) -> Result<CompanyRecord, ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        // Wait for the overview panel before reading labels off it.
        for i in 0..self.config.max_poll_rounds {
            let ready = self
                .eval_bool("document.body && document.body.textContent.length > 0")
                .await?;
            if ready {
                break;
            }
            if i % 5 == 0 {
                info!(
                    "Waiting for detail page of {}... ({}/{})",
                    codigo,
                    i + 1,
                    self.config.max_poll_rounds
                );
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }

        // Labels sit next to their values; a label that never shows up
        // yields an empty string rather than failing the entry.
        let json = self
            .eval_string(
                r#"
                (function() {
                    function grab(label) {
                        var els = document.querySelectorAll('td, th, p, strong, span, div.card-title, h5');
                        for (var i = 0; i < els.length; i++) {
                            var text = (els[i].textContent || '').trim().toLowerCase();
                            if (text.indexOf(label) === 0) {
                                var sib = els[i].nextElementSibling;
                                if (sib && sib.textContent.trim()) {
                                    return sib.textContent.trim();
                                }
                            }
                        }
                        return '';
                    }
                    return JSON.stringify({
                        nome_do_pregao: grab('nome do pregão'),
                        codigo_de_negociacao: grab('códigos de negociação') || grab('código de negociação'),
                        cnpj: grab('cnpj'),
                        atividade_principal: grab('atividade principal'),
                        classificacao_setorial: grab('classificação setorial'),
                        escriturador: grab('escriturador')
                    });
                })()
                "#,
            )
            .await?;

        let fields: DetailFields = serde_json::from_str(&json)
            .map_err(|e| ScraperError::Extraction(format!("detail fields for {}: {}", codigo, e)))?;

        if fields.nome_do_pregao.is_empty() && fields.cnpj.is_empty() {
            warn!("Detail page of {} yielded no labeled fields", codigo);
        }

        Ok(CompanyRecord {
            codigo: codigo.to_string(),
            nome_do_pregao: fields.nome_do_pregao,
            codigo_de_negociacao: fields.codigo_de_negociacao,
            cnpj: fields.cnpj,
            atividade_principal: fields.atividade_principal,
            classificacao_setorial: fields.classificacao_setorial,
            escriturador: fields.escriturador,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_code_strips_markup() {
        assert_eq!(B3ListingPage::sanitize_code("PETR4"), "PETR4");
        assert_eq!(B3ListingPage::sanitize_code("PETR4'); alert(1); ('"), "PETR4alert1");
        assert_eq!(B3ListingPage::sanitize_code("  VALE3 \n"), "VALE3");
    }

    #[test]
    fn test_detail_fields_default_to_empty() {
        let fields: DetailFields =
            serde_json::from_str(r#"{"nome_do_pregao":"WEG","cnpj":""}"#).unwrap();
        assert_eq!(fields.nome_do_pregao, "WEG");
        assert_eq!(fields.codigo_de_negociacao, "");
        assert_eq!(fields.escriturador, "");
    }
}
