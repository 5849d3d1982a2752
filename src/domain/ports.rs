use crate::domain::model::{RawRecord, ResultSet};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Retrieves a remote resource as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, data: Vec<RawRecord>) -> Result<ResultSet>;
}
