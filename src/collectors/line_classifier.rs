use crate::config::PatternConfig;
use crate::error::{ConfigError, ParseError};
use crate::events::{LogEvent, Severity, Timestamp, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use log::trace;
use regex::Regex;

/// Turns raw text lines into [`LogEvent`]s
///
/// Holds the compiled timestamp, severity and response-time patterns. Marker
/// matching is a case-sensitive substring search: any occurrence of an error
/// marker makes the line an error, even inside free text.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    timestamp: Regex,
    error: Regex,
    warning: Regex,
    response_time: Regex,
}

impl LineClassifier {
    /// Compile a classifier from the configured patterns
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::PatternError` naming the first pattern that fails
    /// to compile.
    ///
    /// # Example
    ///
    /// ```
    /// use logscope::collectors::LineClassifier;
    /// use logscope::config::PatternConfig;
    /// use logscope::events::Severity;
    ///
    /// let classifier = LineClassifier::new(&PatternConfig::default()).unwrap();
    /// let event = classifier.classify("2024-03-12 01:16:30 WARN slow disk").unwrap();
    /// assert_eq!(event.severity, Severity::Warning);
    /// ```
    pub fn new(patterns: &PatternConfig) -> Result<Self, ConfigError> {
        let compile = |name: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::PatternError { name, source })
        };

        Ok(Self {
            timestamp: compile("timestamp", &patterns.timestamp)?,
            error: compile("error", &patterns.error)?,
            warning: compile("warning", &patterns.warning)?,
            response_time: compile("response_time", &patterns.response_time)?,
        })
    }

    /// Classify a single line
    ///
    /// Lines without recognizable structure still classify as `INFO` with no
    /// timestamp and no response time.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` only when the response-time pattern matches but its
    /// capture is missing or not a number, which cannot happen with the
    /// default patterns.
    pub fn classify(&self, line: &str) -> Result<LogEvent, ParseError> {
        let event = LogEvent {
            timestamp: self.extract_timestamp(line),
            severity: self.extract_severity(line),
            message: line.trim().to_string(),
            response_time: self.extract_response_time(line)?,
        };
        trace!("Classified line as {}: {}", event.severity, event.message);
        Ok(event)
    }

    /// First timestamp-shaped substring, if it parses strictly
    fn extract_timestamp(&self, line: &str) -> Option<Timestamp> {
        let found = self.timestamp.find(line)?;
        match NaiveDateTime::parse_from_str(found.as_str(), TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts),
            Err(e) => {
                trace!("Discarding unparseable timestamp '{}': {}", found.as_str(), e);
                None
            }
        }
    }

    fn extract_severity(&self, line: &str) -> Severity {
        if self.error.is_match(line) {
            Severity::Error
        } else if self.warning.is_match(line) {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    fn extract_response_time(&self, line: &str) -> Result<Option<f64>, ParseError> {
        let Some(captures) = self.response_time.captures(line) else {
            return Ok(None);
        };
        let raw = captures.get(1).ok_or(ParseError::MissingCapture)?.as_str();
        let value = raw
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidResponseTime(raw.to_string()))?;
        if !value.is_finite() {
            // Overflowing digit runs are treated like any other malformed token
            trace!("Ignoring out-of-range response time '{}'", raw);
            return Ok(None);
        }
        Ok(Some(value))
    }
}
