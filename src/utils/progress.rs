use crate::utils::error::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Append-only audit trail of completed pipeline stages.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `<timestamp> : <message>`; the file is never truncated.
    pub fn log(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        writeln!(file, "{} : {}", timestamp, message)?;

        tracing::info!("📝 {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    #[test]
    fn test_log_appends_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let log = ProgressLog::new(dir.path().join("code_log.txt"));

        log.log("Preliminaries complete. Initiating ETL process").unwrap();
        log.log("Process Complete").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let (timestamp, message) = lines[0].split_once(" : ").unwrap();
        assert!(NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(message, "Preliminaries complete. Initiating ETL process");
        assert!(lines[1].ends_with(" : Process Complete"));
    }

    #[test]
    fn test_log_never_truncates_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("etl.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "earlier run\n").unwrap();

        ProgressLog::new(&path).log("again").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert_eq!(content.lines().count(), 2);
    }
}
