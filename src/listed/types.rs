//! Listed-companies types

use serde::{Deserialize, Serialize};

/// One listed company, as read from its detail page.
///
/// Created once per entry code when the detail page is first visited and
/// immutable afterwards. Fields the page does not show stay empty strings;
/// a partial record is still a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub codigo: String,
    #[serde(default)]
    pub nome_do_pregao: String,
    #[serde(default)]
    pub codigo_de_negociacao: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub atividade_principal: String,
    #[serde(default)]
    pub classificacao_setorial: String,
    #[serde(default)]
    pub escriturador: String,
}

impl CompanyRecord {
    /// Header of the consolidated table, in column order.
    pub const CSV_HEADER: [&'static str; 7] = [
        "codigo",
        "nome_do_pregao",
        "codigo_de_negociacao",
        "cnpj",
        "atividade_principal",
        "classificacao_setorial",
        "escriturador",
    ];

    /// Field values in the same order as [`CompanyRecord::CSV_HEADER`].
    pub fn fields(&self) -> [&str; 7] {
        [
            &self.codigo,
            &self.nome_do_pregao,
            &self.codigo_de_negociacao,
            &self.cnpj,
            &self.atividade_principal,
            &self.classificacao_setorial,
            &self.escriturador,
        ]
    }
}

/// Crawl tuning for the listed-companies pages.
#[derive(Debug, Clone)]
pub struct ListedConfig {
    /// Paginated listing entry point
    pub listing_url: String,
    /// "next page" actions allowed while syncing the UI to a target page
    pub max_page_sync_attempts: u32,
    /// Attempts per listing page before the crawl gives up
    pub max_page_retries: u32,
    /// First retry backoff; doubles per attempt
    pub initial_backoff_ms: u64,
    /// DOM readiness poll interval
    pub poll_interval_ms: u64,
    /// Poll rounds allowed per readiness wait
    pub max_poll_rounds: u32,
}

impl Default for ListedConfig {
    fn default() -> Self {
        Self {
            listing_url:
                "https://sistemaswebb3-listados.b3.com.br/listedCompaniesPage/search?language=pt-br"
                    .to_string(),
            max_page_sync_attempts: 60,
            max_page_retries: 3,
            initial_backoff_ms: 1000,
            poll_interval_ms: 500,
            max_poll_rounds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_match_header_order() {
        let record = CompanyRecord {
            codigo: "WEGE".to_string(),
            nome_do_pregao: "WEG".to_string(),
            codigo_de_negociacao: "WEGE3".to_string(),
            cnpj: "84.429.695/0001-11".to_string(),
            atividade_principal: "Motores e equipamentos".to_string(),
            classificacao_setorial: "Bens Industriais".to_string(),
            escriturador: "Itaú Corretora".to_string(),
        };
        let fields = record.fields();
        assert_eq!(fields.len(), CompanyRecord::CSV_HEADER.len());
        assert_eq!(fields[0], "WEGE");
        assert_eq!(fields[6], "Itaú Corretora");
    }

    #[test]
    fn test_partial_json_keeps_full_arity() {
        // a checkpoint written before every field existed still loads
        let record: CompanyRecord =
            serde_json::from_str(r#"{"codigo":"AALR","cnpj":"42.771.949/0001-35"}"#).unwrap();
        assert_eq!(record.codigo, "AALR");
        assert_eq!(record.cnpj, "42.771.949/0001-35");
        assert_eq!(record.nome_do_pregao, "");
        assert_eq!(record.escriturador, "");
        assert_eq!(record.fields().len(), 7);
    }

    #[test]
    fn test_listed_config_defaults() {
        let config = ListedConfig::default();
        assert!(config.listing_url.contains("listedCompaniesPage"));
        assert_eq!(config.max_page_retries, 3);
        assert!(config.max_page_sync_attempts > 0);
    }
}
