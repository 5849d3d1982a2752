use crate::adapters::html::parse_document;
use crate::config::toml_config::EtlConfig;
use crate::core::extractor::{self, RowFilter};
use crate::core::locator;
use crate::core::normalizer::{self, NormalizeSpec};
use crate::core::rates::RateTable;
use crate::core::{Fetcher, Pipeline};
use crate::domain::model::{ColumnSpec, RawRecord, ResultSet, TableSelector};
use crate::utils::error::Result;

/// Fetches a page, reads one table from it and normalizes the rows.
pub struct TablePipeline<F: Fetcher> {
    fetcher: F,
    source_url: String,
    rates_url: Option<String>,
    selector: TableSelector,
    columns: ColumnSpec,
    filter: RowFilter,
    normalize: NormalizeSpec,
}

impl<F: Fetcher> TablePipeline<F> {
    pub fn new(config: &EtlConfig, fetcher: F) -> Result<Self> {
        Ok(Self {
            fetcher,
            source_url: config.source.url.clone(),
            rates_url: config.source.rates_url.clone(),
            selector: config.locate.selector.clone(),
            columns: config.column_spec()?,
            filter: config.row_filter(),
            normalize: config.normalize_spec()?,
        })
    }

    async fn load_rates(&self) -> Result<Option<RateTable>> {
        if self.normalize.currencies.is_empty() {
            return Ok(None);
        }
        let url = crate::utils::validation::validate_required_field(
            "source.rates_url",
            &self.rates_url,
        )?;

        tracing::info!("💱 Fetching exchange rates from: {}", url);
        let text = self.fetcher.fetch_text(url).await?;
        RateTable::from_csv(&text).map(Some)
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> Pipeline for TablePipeline<F> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        tracing::info!("🚀 Starting extraction from: {}", self.source_url);

        let page = self.fetcher.fetch_text(&self.source_url).await?;
        let document = parse_document(&page)?;
        let table = locator::locate(&document, &self.selector)?;

        extractor::extract(table, &self.columns, &self.filter)
    }

    async fn transform(&self, data: Vec<RawRecord>) -> Result<ResultSet> {
        tracing::info!("🔧 Starting transform on {} records", data.len());

        let rates = self.load_rates().await?;
        normalizer::normalize(data, &self.columns, &self.normalize, rates.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Value;
    use crate::utils::error::EtlError;
    use std::collections::HashMap;

    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| EtlError::FetchError {
                    url: url.to_string(),
                    message: "HTTP 404".to_string(),
                })
        }
    }

    const PAGE: &str = r#"<html><body>
<table><tr><td>navigation</td></tr></table>
<table>
  <tr><th>Rank</th><th>Bank</th><th>Market cap</th></tr>
  <tr><td>1</td><td>Bank A</td><td>1,234.50</td></tr>
  <tr><td>2</td><td>Bank B</td><td>—</td></tr>
  <tr><td>3</td><td>Bank C</td><td>88.00</td></tr>
</table>
</body></html>"#;

    const RATES: &str = "Currency,Rate\nEUR,0.93\nGBP,0.8\n";

    fn config(index: usize) -> EtlConfig {
        let toml = format!(
            r#"
[pipeline]
name = "unit"

[source]
url = "https://example.com/page"
rates_url = "https://example.com/rates.csv"

[locate]
selector = {{ by = "index", index = {} }}

[extract]
skip_header = true
missing_sentinel = "—"

[[extract.columns]]
name = "Name"
cell = 1

[[extract.columns]]
name = "MC_USD_Billion"
cell = 2
numeric = true

[[transform.currencies]]
code = "EUR"
field = "MC_EUR_Billion"

[load]
csv_path = "out.csv"
db_path = "out.db"
table_name = "banks"
query = "SELECT * FROM banks"
"#,
            index
        );
        EtlConfig::from_toml_str(&toml).unwrap()
    }

    fn fetcher() -> StaticFetcher {
        StaticFetcher::new(&[
            ("https://example.com/page", PAGE),
            ("https://example.com/rates.csv", RATES),
        ])
    }

    #[tokio::test]
    async fn test_extract_and_transform() {
        let pipeline = TablePipeline::new(&config(1), fetcher()).unwrap();

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 2);

        let result = pipeline.transform(records).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.value(0, "Name"), Some(&Value::Text("Bank A".to_string())));
        assert_eq!(result.value(1, "MC_EUR_Billion"), Some(&Value::Real(81.84)));
    }

    #[tokio::test]
    async fn test_wrong_table_position() {
        let pipeline = TablePipeline::new(&config(5), fetcher()).unwrap();
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::NotFoundError { .. }));

        // the navigation table has too few cells for the column layout
        let pipeline = TablePipeline::new(&config(0), fetcher()).unwrap();
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_missing_rates_file_is_fetch_error() {
        let only_page = StaticFetcher::new(&[("https://example.com/page", PAGE)]);
        let pipeline = TablePipeline::new(&config(1), only_page).unwrap();

        let records = pipeline.extract().await.unwrap();
        let err = pipeline.transform(records).await.unwrap_err();
        assert!(matches!(err, EtlError::FetchError { ref url, .. } if url.ends_with("rates.csv")));
    }
}
