use crate::error::ReportError;
use crate::events::{AnalysisSummary, Timestamp};
use chrono::Local;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name suffix for generated artifacts, e.g. `20240312_011745`
pub fn timestamp_suffix(at: Timestamp) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Persists one summary per cycle as pretty-printed JSON
///
/// Files are named `log_summary_<YYYYMMDD_HHMMSS>.json`. Two writes within the
/// same second target the same file and the later one wins.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `summary` stamped with the current local time
    pub fn write(&self, summary: &AnalysisSummary) -> Result<PathBuf, ReportError> {
        self.write_at(summary, Local::now().naive_local())
    }

    /// Write `summary` stamped with `generated_at`
    ///
    /// Creates the output directory if needed.
    pub fn write_at(
        &self,
        summary: &AnalysisSummary,
        generated_at: Timestamp,
    ) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("log_summary_{}.json", timestamp_suffix(generated_at)));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("Saved report to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn generated_at() -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(1, 20, 0)
            .unwrap()
    }

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            total_logs: 4,
            error_count: 1,
            warning_count: 1,
            info_count: 2,
            avg_response_time: Some(3083.5666666666666),
            max_response_time: Some(8000.0),
            start_time: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(1, 15, 23),
            end_time: None,
        }
    }

    #[test]
    fn test_write_creates_named_report() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));

        let path = writer.write_at(&summary(), generated_at()).unwrap();
        assert_eq!(
            path,
            dir.path().join("reports").join("log_summary_20240312_012000.json")
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["total_logs"], 4);
        assert_eq!(value["max_response_time"], 8000.0);
        assert_eq!(value["start_time"], "2024-03-12 01:15:23");
        assert!(value["end_time"].is_null());
    }

    #[test]
    fn test_report_round_trips() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer.write_at(&summary(), generated_at()).unwrap();

        let parsed: AnalysisSummary =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, summary());
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "x").unwrap();

        let writer = ReportWriter::new(&blocker);
        assert!(matches!(
            writer.write_at(&summary(), generated_at()),
            Err(ReportError::IoError(_))
        ));
    }

    #[test]
    fn test_timestamp_suffix() {
        assert_eq!(timestamp_suffix(generated_at()), "20240312_012000");
    }
}
