pub mod etl;
pub mod extractor;
pub mod locator;
pub mod normalizer;
pub mod pipeline;
pub mod rates;

pub use crate::domain::model::{RawRecord, ResultSet};
pub use crate::domain::ports::{Fetcher, Pipeline};
pub use crate::utils::error::Result;
