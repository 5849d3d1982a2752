use crate::config::toml_config::{EtlConfig, Preset};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "econ-etl")]
#[command(about = "Scrape an economic indicator table, normalize it and load it into CSV and SQLite")]
pub struct CliConfig {
    /// Path to a pipeline TOML file
    #[arg(short, long, conflicts_with = "preset")]
    pub config: Option<String>,

    /// Built-in pipeline to run when no config file is given
    #[arg(short, long, value_enum, default_value = "banks")]
    pub preset: Preset,

    /// Override the query run after loading
    #[arg(long)]
    pub query: Option<String>,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print query rows as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit diagnostic logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliConfig {
    /// Resolves the pipeline configuration and applies command-line overrides.
    pub fn load_config(&self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                EtlConfig::from_file(path)?
            }
            None => {
                tracing::info!("📁 Using built-in preset: {:?}", self.preset);
                EtlConfig::preset(self.preset)?
            }
        };

        if let Some(query) = &self.query {
            tracing::info!("🔧 Query overridden to: {}", query);
            config.load.query = query.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_banks_preset() {
        let cli = CliConfig::parse_from(["econ-etl"]);
        assert_eq!(cli.preset, Preset::Banks);
        let config = cli.load_config().unwrap();
        assert_eq!(config.load.table_name, "Largest_banks");
    }

    #[test]
    fn test_query_override() {
        let cli = CliConfig::parse_from([
            "econ-etl",
            "--preset",
            "gdp",
            "--query",
            "SELECT COUNT(*) FROM Countries_by_GDP",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.load.query, "SELECT COUNT(*) FROM Countries_by_GDP");
        assert_eq!(config.load.table_name, "Countries_by_GDP");
    }

    #[test]
    fn test_config_and_preset_conflict() {
        let result =
            CliConfig::try_parse_from(["econ-etl", "--config", "x.toml", "--preset", "gdp"]);
        assert!(result.is_err());
    }
}
