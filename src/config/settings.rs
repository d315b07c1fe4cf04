use crate::error::ConfigError;
use chrono::NaiveTime;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
///
/// Every section has defaults, so a partial (or empty) TOML file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub patterns: PatternConfig,
    pub thresholds: AlertThresholds,
    pub smtp: SmtpConfig,
    pub schedule: ScheduleConfig,
    pub retention: RetentionConfig,
    pub visualization: VisualizationConfig,
    pub logging: LoggingConfig,
}

/// Directories read and written by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub visualizations_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            reports_dir: PathBuf::from("reports"),
            visualizations_dir: PathBuf::from("visualizations"),
        }
    }
}

/// Regular expressions used by the line classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Located timestamp is parsed with [`crate::events::TIMESTAMP_FORMAT`]
    pub timestamp: String,
    pub error: String,
    pub warning: String,
    /// Must contain one capture group holding the number
    pub response_time: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            timestamp: r"[0-9]{4}-[0-9]{2}-[0-9]{2}\s[0-9]{2}:[0-9]{2}:[0-9]{2}".to_string(),
            error: "ERROR|CRITICAL|FATAL".to_string(),
            warning: "WARNING|WARN".to_string(),
            response_time: r"response_time=([0-9]+\.?[0-9]*)".to_string(),
        }
    }
}

/// Alerting thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Response time in milliseconds above which an event is alert-worthy
    pub response_time: f64,
    /// Errors per hour. Kept for reference, not enforced by the alert decision.
    pub error_count: u32,
    /// Disk usage percentage flagged by the metrics report
    pub disk_usage: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            response_time: 5000.0,
            error_count: 5,
            disk_usage: 90.0,
        }
    }
}

/// SMTP transport settings for email alerts
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub to_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            to_email: String::new(),
        }
    }
}

// Manual impl so the password never reaches the logs
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .finish()
    }
}

impl SmtpConfig {
    /// Whether login credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Timing of the scheduled service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub analysis_interval_minutes: u64,
    /// Local time of day, `HH:MM`
    pub cleanup_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            analysis_interval_minutes: 60,
            cleanup_time: "00:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// Parse `cleanup_time` into a time of day
    pub fn cleanup_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.cleanup_time, "%H:%M").map_err(|e| {
            ConfigError::ValidationError(format!(
                "cleanup_time '{}' is not HH:MM: {}",
                self.cleanup_time, e
            ))
        })
    }
}

/// How long reports and charts are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { days: 7 }
    }
}

/// Chart dimensions in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

/// Diagnostic log destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append diagnostics to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file and validate it
    ///
    /// SMTP settings are then overridden from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML, and
    /// `ConfigError::ValidationError`/`PatternError` for invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Override SMTP settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override SMTP settings using the given variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let smtp = &mut self.smtp;
        if let Some(server) = lookup("SMTP_SERVER") {
            smtp.server = server;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            match port.parse() {
                Ok(port) => smtp.port = port,
                Err(_) => debug!("Ignoring non-numeric SMTP_PORT '{}'", port),
            }
        }
        if let Some(username) = lookup("SMTP_USERNAME") {
            smtp.username = username;
        }
        if let Some(password) = lookup("SMTP_PASSWORD") {
            smtp.password = password;
        }
        if let Some(from) = lookup("ALERT_FROM_EMAIL") {
            smtp.from_email = from;
        }
        if let Some(to) = lookup("ALERT_TO_EMAIL") {
            smtp.to_email = to;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.analysis_interval_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "schedule.analysis_interval_minutes must be greater than zero".to_string(),
            ));
        }
        self.schedule.cleanup_time()?;

        if !self.thresholds.response_time.is_finite() || self.thresholds.response_time < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "thresholds.response_time must be a non-negative number, got {}",
                self.thresholds.response_time
            )));
        }
        if !(0.0..=100.0).contains(&self.thresholds.disk_usage) {
            return Err(ConfigError::ValidationError(format!(
                "thresholds.disk_usage must be between 0 and 100, got {}",
                self.thresholds.disk_usage
            )));
        }

        if self.visualization.width == 0 || self.visualization.height == 0 {
            return Err(ConfigError::ValidationError(
                "visualization width and height must be greater than zero".to_string(),
            ));
        }

        for (name, pattern) in [
            ("timestamp", &self.patterns.timestamp),
            ("error", &self.patterns.error),
            ("warning", &self.patterns.warning),
            ("response_time", &self.patterns.response_time),
        ] {
            Regex::new(pattern).map_err(|source| ConfigError::PatternError { name, source })?;
        }

        Ok(())
    }
}
