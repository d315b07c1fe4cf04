use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole analysis cycle
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Log directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    #[error("Failed to read log directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while classifying a single line
///
/// A line that produces one of these is dropped from the cycle.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Response time pattern matched without a capture group")]
    MissingCapture,

    #[error("Invalid response time value: {0}")]
    InvalidResponseTime(String),
}

/// Errors that can occur while persisting a summary report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while rendering charts
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("No data available for chart: {0}")]
    NoData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur when sending alerts
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Notifier is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to build alert message: {0}")]
    MessageError(String),

    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("Invalid pattern '{name}': {source}")]
    PatternError {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors raised by directory bootstrap and retention cleanup
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
