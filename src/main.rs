use clap::Parser;
use econ_etl::utils::error::EtlError;
use econ_etl::utils::logger;
use econ_etl::utils::validation::Validate;
use econ_etl::{CliConfig, EtlConfig, EtlEngine, HttpFetcher, ProgressLog, RunReport, TablePipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting econ-etl CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    if cli.dry_run {
        print_summary(&config);
        return Ok(());
    }

    let pipeline = match TablePipeline::new(&config, HttpFetcher::new()) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(e),
    };
    let progress = ProgressLog::new(&config.logging.progress_log);
    let engine = EtlEngine::new(pipeline, config.load.clone(), progress);

    match engine.run().await {
        Ok(report) => {
            tracing::info!(
                "✅ ETL process completed: {} records loaded into {}",
                report.records,
                report.table_name
            );
            print_report(&report, cli.json)?;
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn print_summary(config: &EtlConfig) {
    println!("Pipeline:  {}", config.pipeline.name);
    println!("Source:    {}", config.source.url);
    if let Some(rates_url) = &config.source.rates_url {
        println!("Rates:     {}", rates_url);
    }
    println!("Table:     {}", config.locate.selector);
    let names: Vec<&str> = config.extract.columns.iter().map(|c| c.name.as_str()).collect();
    println!("Columns:   {}", names.join(", "));
    println!("CSV:       {}", config.load.csv_path);
    println!("Database:  {} ({})", config.load.db_path, config.load.table_name);
    println!("Query:     {}", config.load.query);
    println!("Log:       {}", config.logging.progress_log);
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.query_output.to_json())?);
    } else {
        println!("{}", report.query);
        println!("{}", report.query_output);
    }
    Ok(())
}

fn fail(e: EtlError) -> ! {
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
