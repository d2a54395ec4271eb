//! Crawl loop
//!
//! Phase 1 walks the listing pages 1..=N, records each company's detail URL
//! as a checkpoint and audits the page before moving on. Phase 2 visits the
//! recorded URLs and checkpoints the extracted attributes. Both phases skip
//! any entry whose checkpoint already exists, so a rerun after a crash only
//! performs the missing work.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::error::ScraperError;

use super::audit;
use super::page::ListingPage;
use super::types::ListedConfig;

/// Phase-1 counters.
#[derive(Debug, Default, Clone)]
pub struct CrawlSummary {
    pub pages: u32,
    pub discovered: usize,
    pub visited: usize,
    pub skipped: usize,
}

/// Phase-2 counters.
#[derive(Debug, Default, Clone)]
pub struct DetailSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Crawler<'a, P: ListingPage> {
    page: &'a mut P,
    store: &'a CheckpointStore,
    config: &'a ListedConfig,
}

impl<'a, P: ListingPage> Crawler<'a, P> {
    pub fn new(page: &'a mut P, store: &'a CheckpointStore, config: &'a ListedConfig) -> Self {
        Self {
            page,
            store,
            config,
        }
    }

    /// Bring the UI to `target`. A matching page is a no-op; a lagging page
    /// is corrected with "next page" actions, at most
    /// `max_page_sync_attempts` of them. A UI past the target cannot be
    /// walked back and fails immediately.
    pub async fn sync_to_page(&mut self, target: u32) -> Result<(), ScraperError> {
        let mut displayed = self.page.displayed_page().await?;
        if displayed == target {
            return Ok(());
        }
        for _ in 0..self.config.max_page_sync_attempts {
            if displayed > target {
                break;
            }
            self.page.advance().await?;
            displayed = self.page.displayed_page().await?;
            if displayed == target {
                return Ok(());
            }
        }
        Err(ScraperError::PageDrift {
            expected: target,
            displayed,
        })
    }

    /// Codes visible on the current page, deduplicated and sorted.
    async fn extract_codes(&mut self) -> Result<Vec<String>, ScraperError> {
        let raw = self.page.visible_codes().await?;
        let unique: HashSet<String> = raw
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if unique.is_empty() {
            warn!("Listing page rendered zero company cards");
        }
        let mut codes: Vec<String> = unique.into_iter().collect();
        codes.sort();
        Ok(codes)
    }

    /// One listing page: sync, extract, visit every un-checkpointed code,
    /// audit. Every detail visit bounces the UI back to page 1, so the
    /// navigator re-syncs after each one.
    async fn process_page(
        &mut self,
        number: u32,
        summary: &mut CrawlSummary,
    ) -> Result<(), ScraperError> {
        self.sync_to_page(number).await?;
        let codes = self.extract_codes().await?;
        info!("Page {}: {} companies", number, codes.len());
        summary.discovered += codes.len();

        for codigo in &codes {
            if self.store.exists(&self.store.url_path(codigo)) {
                summary.skipped += 1;
                continue;
            }
            let url = self.page.open_detail(codigo).await?;
            self.store.save_url(codigo, &url)?;
            summary.visited += 1;
            self.sync_to_page(number).await?;
        }

        audit::audit_page(self.store, number, &codes);
        Ok(())
    }

    /// Phase 1: collect every company's detail URL.
    pub async fn collect_links(&mut self) -> Result<CrawlSummary, ScraperError> {
        let total = self.page.total_pages().await?;
        info!("Listing reports {} pages", total);

        let mut summary = CrawlSummary::default();
        for number in 1..=total {
            let mut attempt = 0;
            loop {
                match self.process_page(number, &mut summary).await {
                    Ok(()) => break,
                    Err(e) if e.is_retryable() && attempt + 1 < self.config.max_page_retries => {
                        let backoff = self.config.initial_backoff_ms * 2u64.pow(attempt);
                        warn!(
                            "Page {} attempt {} failed, retrying in {}ms: {}",
                            number,
                            attempt + 1,
                            backoff,
                            e
                        );
                        sleep(Duration::from_millis(backoff)).await;
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
            summary.pages = number;
        }

        info!(
            "Link collection done: {} pages, {} visited, {} already present",
            summary.pages, summary.visited, summary.skipped
        );
        Ok(summary)
    }

    /// Phase 2: visit every recorded URL whose attributes are not yet
    /// checkpointed. Failures that outlast the retries abandon the entry and
    /// move on; the auditor surfaces the gap.
    pub async fn collect_details(&mut self) -> Result<DetailSummary, ScraperError> {
        let mut summary = DetailSummary::default();

        for codigo in self.store.codes()? {
            if self.store.exists(&self.store.infos_path(&codigo)) {
                summary.skipped += 1;
                continue;
            }
            let url = match self.store.load_url(&codigo) {
                Ok(url) => url,
                Err(e) => {
                    warn!("No URL checkpoint for {}: {}", codigo, e);
                    summary.failed += 1;
                    continue;
                }
            };

            let mut attempt = 0;
            let record = loop {
                match self.page.read_detail(&codigo, &url).await {
                    Ok(record) => break Some(record),
                    Err(e) if e.is_retryable() && attempt + 1 < self.config.max_page_retries => {
                        let backoff = self.config.initial_backoff_ms * 2u64.pow(attempt);
                        warn!(
                            "Detail visit for {} attempt {} failed, retrying in {}ms: {}",
                            codigo,
                            attempt + 1,
                            backoff,
                            e
                        );
                        sleep(Duration::from_millis(backoff)).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        warn!("Abandoning {} after {} attempts: {}", codigo, attempt + 1, e);
                        break None;
                    }
                }
            };

            match record {
                Some(record) => {
                    self.store.save_record(&record)?;
                    summary.written += 1;
                }
                None => summary.failed += 1,
            }
        }

        info!(
            "Detail collection done: {} written, {} already present, {} failed",
            summary.written, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listed::types::CompanyRecord;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Deterministic stand-in for the live listing: fixed pages of codes,
    /// detail visits reset the current page to 1 the way the real SPA does.
    struct FakeListingPage {
        pages: Vec<Vec<&'static str>>,
        current: u32,
        stuck: bool,
        advance_calls: usize,
        open_calls: Vec<String>,
        read_calls: Vec<String>,
        fail_open_once: HashSet<String>,
        blank_cnpj: HashSet<String>,
    }

    impl FakeListingPage {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                current: 1,
                stuck: false,
                advance_calls: 0,
                open_calls: Vec::new(),
                read_calls: Vec::new(),
                fail_open_once: HashSet::new(),
                blank_cnpj: HashSet::new(),
            }
        }
    }

    #[async_trait]
    impl ListingPage for FakeListingPage {
        async fn displayed_page(&mut self) -> Result<u32, ScraperError> {
            Ok(self.current)
        }

        async fn total_pages(&mut self) -> Result<u32, ScraperError> {
            Ok(self.pages.len() as u32)
        }

        async fn advance(&mut self) -> Result<(), ScraperError> {
            self.advance_calls += 1;
            if !self.stuck && (self.current as usize) < self.pages.len() {
                self.current += 1;
            }
            Ok(())
        }

        async fn visible_codes(&mut self) -> Result<Vec<String>, ScraperError> {
            Ok(self.pages[self.current as usize - 1]
                .iter()
                .map(|code| code.to_string())
                .collect())
        }

        async fn open_detail(&mut self, codigo: &str) -> Result<String, ScraperError> {
            if self.fail_open_once.remove(codigo) {
                return Err(ScraperError::Timeout(format!("card {} not clickable", codigo)));
            }
            self.open_calls.push(codigo.to_string());
            self.current = 1;
            Ok(format!("https://fake.local/detail/{}", codigo))
        }

        async fn read_detail(
            &mut self,
            codigo: &str,
            url: &str,
        ) -> Result<CompanyRecord, ScraperError> {
            assert!(url.ends_with(codigo));
            self.read_calls.push(codigo.to_string());
            Ok(CompanyRecord {
                codigo: codigo.to_string(),
                nome_do_pregao: format!("{} SA", codigo),
                codigo_de_negociacao: format!("{}3", codigo),
                cnpj: if self.blank_cnpj.contains(codigo) {
                    String::new()
                } else {
                    "00.000.000/0001-00".to_string()
                },
                atividade_principal: "Holding".to_string(),
                classificacao_setorial: "Financeiro".to_string(),
                escriturador: "Banco Teste".to_string(),
            })
        }
    }

    fn quick_config() -> ListedConfig {
        ListedConfig {
            initial_backoff_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_matching_page_needs_zero_advances() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["AAAA"], vec!["BBBB"]]);

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        crawler.sync_to_page(1).await.unwrap();
        assert_eq!(crawler.page.advance_calls, 0);
    }

    #[tokio::test]
    async fn test_drift_corrected_by_advancing() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["A"], vec!["B"], vec!["C"]]);

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        crawler.sync_to_page(3).await.unwrap();
        assert_eq!(crawler.page.advance_calls, 2);
        assert_eq!(crawler.page.current, 3);
    }

    #[tokio::test]
    async fn test_stuck_pagination_is_bounded() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["A"], vec!["B"]]);
        ui.stuck = true;

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let err = crawler.sync_to_page(2).await.unwrap_err();
        assert!(matches!(
            err,
            ScraperError::PageDrift {
                expected: 2,
                displayed: 1
            }
        ));
        assert_eq!(
            crawler.page.advance_calls,
            config.max_page_sync_attempts as usize
        );
    }

    #[tokio::test]
    async fn test_overshoot_fails_without_advancing_forever() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["A"], vec!["B"], vec!["C"]]);
        ui.current = 3;

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let err = crawler.sync_to_page(2).await.unwrap_err();
        assert!(matches!(err, ScraperError::PageDrift { expected: 2, .. }));
        assert_eq!(crawler.page.advance_calls, 0);
    }

    #[tokio::test]
    async fn test_extractor_deduplicates_repeated_cards() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["PETR", "PETR", "VALE", " "]]);

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let codes = crawler.extract_codes().await.unwrap();
        assert_eq!(codes, vec!["PETR", "VALE"]);
    }

    #[tokio::test]
    async fn test_full_crawl_checkpoints_every_code_once() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![
            vec!["AAAA", "BBBB"],
            vec!["CCCC", "DDDD"],
            vec!["EEEE", "FFFF"],
        ]);

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let links = crawler.collect_links().await.unwrap();
        assert_eq!(links.pages, 3);
        assert_eq!(links.visited, 6);
        assert_eq!(links.skipped, 0);

        let details = crawler.collect_details().await.unwrap();
        assert_eq!(details.written, 6);
        assert_eq!(details.failed, 0);

        let codes = store.codes().unwrap();
        assert_eq!(codes.len(), 6);
        for codigo in &codes {
            assert!(store.exists(&store.url_path(codigo)));
            assert!(store.exists(&store.infos_path(codigo)));
        }

        // consolidated table: six rows, one per code, no duplicates
        let processed = TempDir::new().unwrap();
        let (csv_path, rows) =
            crate::listed::transform::consolidate(&store, processed.path()).unwrap();
        assert_eq!(rows, 6);
        let content = std::fs::read_to_string(csv_path).unwrap();
        let mut seen: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|line| line.split(';').next().unwrap())
            .collect();
        assert_eq!(seen.len(), 6);
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_rerun_never_revisits_checkpointed_codes() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["AAAA", "BBBB"], vec!["CCCC", "DDDD"]]);

        {
            let mut crawler = Crawler::new(&mut ui, &store, &config);
            crawler.collect_links().await.unwrap();
            crawler.collect_details().await.unwrap();
        }
        assert_eq!(ui.open_calls.len(), 4);
        assert_eq!(ui.read_calls.len(), 4);

        // Second run over the same store: all work already checkpointed.
        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let links = crawler.collect_links().await.unwrap();
        let details = crawler.collect_details().await.unwrap();
        assert_eq!(links.visited, 0);
        assert_eq!(links.skipped, 4);
        assert_eq!(details.written, 0);
        assert_eq!(details.skipped, 4);
        assert_eq!(ui.open_calls.len(), 4);
        assert_eq!(ui.read_calls.len(), 4);
    }

    #[tokio::test]
    async fn test_deleted_checkpoint_is_recreated_alone() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["AAAA", "BBBB"], vec!["CCCC", "DDDD"]]);

        {
            let mut crawler = Crawler::new(&mut ui, &store, &config);
            crawler.collect_links().await.unwrap();
        }
        std::fs::remove_file(store.url_path("CCCC")).unwrap();
        ui.open_calls.clear();

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let links = crawler.collect_links().await.unwrap();
        assert_eq!(links.visited, 1);
        assert_eq!(links.skipped, 3);
        assert_eq!(ui.open_calls, vec!["CCCC"]);
        assert!(store.exists(&store.url_path("CCCC")));
    }

    #[tokio::test]
    async fn test_partial_record_is_kept_with_full_arity() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["AAAA"]]);
        ui.blank_cnpj.insert("AAAA".to_string());

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        crawler.collect_links().await.unwrap();
        let details = crawler.collect_details().await.unwrap();
        assert_eq!(details.written, 1);

        let record = store.load_record("AAAA").unwrap();
        assert_eq!(record.cnpj, "");
        assert_eq!(record.fields().len(), 7);
    }

    #[tokio::test]
    async fn test_transient_page_failure_is_retried() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        let config = quick_config();
        let mut ui = FakeListingPage::new(vec![vec!["AAAA", "BBBB"]]);
        ui.fail_open_once.insert("BBBB".to_string());

        let mut crawler = Crawler::new(&mut ui, &store, &config);
        let links = crawler.collect_links().await.unwrap();

        // AAAA checkpointed on the first attempt is skipped on the retry.
        assert_eq!(links.visited, 2);
        assert_eq!(links.skipped, 1);
        assert!(store.exists(&store.url_path("AAAA")));
        assert!(store.exists(&store.url_path("BBBB")));
    }
}
