use crate::adapters::flat_file::write_flat_file;
use crate::adapters::sqlite::{Database, QueryOutput};
use crate::config::toml_config::LoadConfig;
use crate::core::Pipeline;
use crate::domain::model::ResultSet;
use crate::utils::error::Result;
use crate::utils::progress::ProgressLog;
use std::path::{Path, PathBuf};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: usize,
    pub csv_path: PathBuf,
    pub table_name: String,
    pub query: String,
    pub query_output: QueryOutput,
}

/// Runs one pipeline end to end, recording each completed stage.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    load: LoadConfig,
    progress: ProgressLog,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P, load: LoadConfig, progress: ProgressLog) -> Self {
        Self {
            pipeline,
            load,
            progress,
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.progress
            .log("Preliminaries complete. Initiating ETL process")?;

        let raw_data = self.pipeline.extract().await?;
        self.progress
            .log("Data extraction complete. Initiating Transformation process")?;

        let result = self.pipeline.transform(raw_data).await?;
        self.progress
            .log("Data transformation complete. Initiating loading process")?;

        let csv_path = Path::new(&self.load.csv_path);
        write_flat_file(&result, csv_path)?;
        self.progress.log("Data saved to CSV file")?;

        let db = Database::open(&self.load.db_path)?;
        let outcome = self.load_and_query(&db, &result);
        let closed = db.close();
        let query_output = outcome?;
        closed?;

        self.progress.log("Process Complete")?;

        Ok(RunReport {
            records: result.len(),
            csv_path: csv_path.to_path_buf(),
            table_name: self.load.table_name.clone(),
            query: self.load.query.clone(),
            query_output,
        })
    }

    /// Everything done while the connection is open; the caller closes it afterwards.
    fn load_and_query(&self, db: &Database, result: &ResultSet) -> Result<QueryOutput> {
        self.progress.log("SQL Connection initiated")?;

        db.write_table(result, &self.load.table_name)?;
        self.progress
            .log("Data loaded to Database as table. Executing query")?;

        tracing::info!("🔎 Executing query: {}", self.load.query);
        db.query(&self.load.query)
    }
}
