//! Core event types for the log analyzer
//!
//! This module defines the data structures shared by every stage of an analysis
//! cycle: the classified [`LogEvent`], its [`Severity`], and the per-cycle
//! [`AnalysisSummary`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type for log lines
///
/// Log files carry wall-clock times without an offset, so they are kept naive.
pub type Timestamp = NaiveDateTime;

/// Format used both for parsing log lines and for serializing report timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a classified log line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Line without any error or warning marker
    Info,
    /// Line carrying a `WARNING`/`WARN` marker
    Warning,
    /// Line carrying an `ERROR`/`CRITICAL`/`FATAL` marker
    Error,
}

impl Severity {
    /// All severities, least severe first
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    /// Timestamp found in the line, if any
    #[serde(with = "optional_timestamp")]
    pub timestamp: Option<Timestamp>,
    /// Classified severity
    pub severity: Severity,
    /// The original line, trimmed
    pub message: String,
    /// Embedded `response_time=<ms>` value, if any
    pub response_time: Option<f64>,
}

impl LogEvent {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Aggregate statistics for one analysis cycle
///
/// Statistics over optional fields are `None` when no event carries the field,
/// and serialize as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub total_logs: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub avg_response_time: Option<f64>,
    pub max_response_time: Option<f64>,
    #[serde(with = "optional_timestamp")]
    pub start_time: Option<Timestamp>,
    #[serde(with = "optional_timestamp")]
    pub end_time: Option<Timestamp>,
}

impl AnalysisSummary {
    /// Count for a single severity
    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::Info => self.info_count,
            Severity::Warning => self.warning_count,
            Severity::Error => self.error_count,
        }
    }
}

/// Serde adapter writing `Option<Timestamp>` as `"YYYY-MM-DD HH:MM:SS"` or `null`
pub mod optional_timestamp {
    use super::{Timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"INFO\"");
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"WARNING\""
        );
        assert_eq!(
            serde_json::to_string(&Severity::Error).unwrap(),
            "\"ERROR\""
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_summary_serializes_absent_values_as_null() {
        let summary = AnalysisSummary {
            total_logs: 1,
            error_count: 0,
            warning_count: 0,
            info_count: 1,
            avg_response_time: None,
            max_response_time: None,
            start_time: None,
            end_time: None,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["avg_response_time"].is_null());
        assert!(value["max_response_time"].is_null());
        assert!(value["start_time"].is_null());
        assert!(value["end_time"].is_null());
        assert_eq!(value["total_logs"], 1);
    }

    #[test]
    fn test_summary_timestamp_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(1, 15, 23)
            .unwrap();
        let summary = AnalysisSummary {
            total_logs: 1,
            error_count: 1,
            warning_count: 0,
            info_count: 0,
            avg_response_time: Some(8000.0),
            max_response_time: Some(8000.0),
            start_time: Some(ts),
            end_time: Some(ts),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["start_time"], "2024-03-12 01:15:23");
        assert_eq!(value["avg_response_time"], 8000.0);

        let parsed: AnalysisSummary = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, summary);
    }
}
