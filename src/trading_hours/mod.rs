//! Equity trading-hours schedule
//!
//! Fetches the schedule table from the B3 site, checkpoints its raw HTML,
//! and reshapes it into a flat CSV with one start/end column pair per
//! session phase.

pub mod scraper;
pub mod transform;

pub use scraper::TradingHoursExtractor;

pub const OUTPUT_FILE: &str = "Tabela_horarios_de_negociacao_no_mercado_de_acoes.csv";
