pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpFetcher;
pub use adapters::sqlite::{Database, QueryOutput};
pub use config::{EtlConfig, Preset};
pub use core::{
    etl::{EtlEngine, RunReport},
    pipeline::TablePipeline,
};
pub use utils::error::{EtlError, Result};
pub use utils::progress::ProgressLog;
