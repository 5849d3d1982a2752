use crate::core::extractor::RowFilter;
use crate::core::normalizer::{CurrencyTarget, NormalizeSpec, Rescale};
use crate::domain::model::{ColumnDef, ColumnSpec, TableSelector};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    pub pipeline: PipelineInfo,
    pub source: SourceConfig,
    pub locate: LocateConfig,
    pub extract: ExtractConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    pub load: LoadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    /// Exchange-rate CSV; required when currencies are configured.
    pub rates_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateConfig {
    pub selector: TableSelector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub skip_header: bool,
    pub missing_sentinel: Option<String>,
    #[serde(default)]
    pub sentinel_fields: Vec<String>,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Defaults to the first numeric column.
    pub primary_field: Option<String>,
    pub rescale: Option<Rescale>,
    #[serde(default)]
    pub currencies: Vec<CurrencyTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub csv_path: String,
    pub db_path: String,
    pub table_name: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_progress_log")]
    pub progress_log: String,
}

fn default_progress_log() -> String {
    "./etl_project_log.txt".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            progress_log: default_progress_log(),
        }
    }
}

/// Built-in pipeline configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Preset {
    Banks,
    Gdp,
}

impl Preset {
    fn source(&self) -> &'static str {
        match self {
            Preset::Banks => include_str!("../../configs/banks.toml"),
            Preset::Gdp => include_str!("../../configs/gdp.toml"),
        }
    }
}

impl EtlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn preset(preset: Preset) -> Result<Self> {
        Self::from_toml_str(preset.source())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn column_spec(&self) -> Result<ColumnSpec> {
        ColumnSpec::new(self.extract.columns.clone())
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter {
            skip_header: self.extract.skip_header,
            missing_sentinel: self.extract.missing_sentinel.clone(),
            sentinel_fields: self.extract.sentinel_fields.clone(),
        }
    }

    pub fn normalize_spec(&self) -> Result<NormalizeSpec> {
        let primary_field = match &self.transform.primary_field {
            Some(field) => field.clone(),
            None => self
                .extract
                .columns
                .iter()
                .find(|c| c.numeric)
                .map(|c| c.name.clone())
                .ok_or_else(|| EtlError::MissingConfigError {
                    field: "transform.primary_field".to_string(),
                })?,
        };

        Ok(NormalizeSpec {
            primary_field,
            rescale: self.transform.rescale.clone(),
            currencies: self.transform.currencies.clone(),
        })
    }

    pub fn uses_rates(&self) -> bool {
        !self.transform.currencies.is_empty()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_url("source.url", &self.source.url)?;

        if self.uses_rates() {
            let rates_url =
                validation::validate_required_field("source.rates_url", &self.source.rates_url)?;
            validation::validate_url("source.rates_url", rates_url)?;
        }

        let columns = self.column_spec()?;
        for field in &self.extract.sentinel_fields {
            if columns.get(field).is_none() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "extract.sentinel_fields".to_string(),
                    value: field.clone(),
                    reason: "not a configured column".to_string(),
                });
            }
        }

        let spec = self.normalize_spec()?;
        match columns.get(&spec.primary_field) {
            Some(column) if column.numeric => {}
            _ => {
                return Err(EtlError::InvalidConfigValueError {
                    field: "transform.primary_field".to_string(),
                    value: spec.primary_field.clone(),
                    reason: "must name a numeric column".to_string(),
                })
            }
        }

        if let Some(rescale) = &spec.rescale {
            if !(rescale.factor.is_finite() && rescale.factor > 0.0) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "transform.rescale.factor".to_string(),
                    value: rescale.factor.to_string(),
                    reason: "must be a positive number".to_string(),
                });
            }
        }

        for target in &spec.currencies {
            validation::validate_currency_code("transform.currencies.code", &target.code)?;
            validation::validate_non_empty_string("transform.currencies.field", &target.field)?;
        }

        let output = crate::core::normalizer::output_fields(&columns, &spec);
        validation::validate_unique_names("output fields", output.iter().map(|f| f.name.as_str()))?;

        validation::validate_path("load.csv_path", &self.load.csv_path)?;
        validation::validate_path("load.db_path", &self.load.db_path)?;
        validation::validate_non_empty_string("load.table_name", &self.load.table_name)?;
        validation::validate_non_empty_string("load.query", &self.load.query)?;
        validation::validate_path("logging.progress_log", &self.logging.progress_log)?;

        Ok(())
    }
}

impl FromStr for EtlConfig {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
