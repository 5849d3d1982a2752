use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetch failed for {url}: {message}")]
    FetchError { url: String, message: String },

    #[error("Document structure error: {message}")]
    ParseError { message: String },

    #[error("Table not found: {message}")]
    NotFoundError { message: String },

    #[error("Malformed number in field '{field}' at record {record}: {value:?}")]
    MalformedNumberError {
        field: String,
        value: String,
        record: usize,
    },

    #[error("Unknown rate code: {code}")]
    UnknownRateError { code: String },

    #[error("Sink error: {message}")]
    SinkError { message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for '{field}': {value:?} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Fetch,
    Extraction,
    Transformation,
    Sink,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        EtlError::ParseError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FetchError { .. } => ErrorCategory::Fetch,
            EtlError::ParseError { .. } | EtlError::NotFoundError { .. } => {
                ErrorCategory::Extraction
            }
            EtlError::MalformedNumberError { .. } | EtlError::UnknownRateError { .. } => {
                ErrorCategory::Transformation
            }
            EtlError::SinkError { .. }
            | EtlError::DatabaseError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_) => ErrorCategory::Sink,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // the source may come back on the next run
            ErrorCategory::Fetch => ErrorSeverity::Medium,
            ErrorCategory::Extraction | ErrorCategory::Transformation => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Sink => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Fetch => format!("Could not download source data. {}", self),
            ErrorCategory::Extraction => {
                format!("The page no longer has the expected table layout. {}", self)
            }
            ErrorCategory::Transformation => format!("Could not normalize the data. {}", self),
            ErrorCategory::Sink => format!("Could not write results. {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration. {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FetchError { .. } => "Check network access and the source/rates URLs, then re-run",
            EtlError::NotFoundError { .. } => {
                "The page was restructured; update [locate] selector in the pipeline config"
            }
            EtlError::ParseError { .. } => {
                "Compare the page's table layout with [[extract.columns]] cell offsets"
            }
            EtlError::MalformedNumberError { .. } => {
                "Use the first_text rule or a missing_sentinel for cells with footnotes or placeholders"
            }
            EtlError::UnknownRateError { .. } => {
                "Add the currency to the rate file or remove it from [[transform.currencies]]"
            }
            EtlError::SinkError { .. }
            | EtlError::DatabaseError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_) => "Check that the output paths exist and are writable",
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => "Fix the pipeline TOML file and re-run",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        let not_found = EtlError::NotFoundError {
            message: "index 3".to_string(),
        };
        assert_eq!(not_found.category(), ErrorCategory::Extraction);

        let rate = EtlError::UnknownRateError {
            code: "JPY".to_string(),
        };
        assert_eq!(rate.category(), ErrorCategory::Transformation);
        assert_eq!(rate.exit_code(), 1);

        let io: EtlError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(io.category(), ErrorCategory::Sink);
        assert_eq!(io.exit_code(), 3);
    }

    #[test]
    fn test_fetch_errors_are_retryable_severity() {
        let err = EtlError::FetchError {
            url: "https://example.com".to_string(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("HTTP 503"));
    }
}
