//! Periodic log analysis
//!
//! Scans a directory of `.log` files, classifies every line by severity,
//! summarizes the cycle into a JSON report, renders SVG charts and emails
//! alerts for error events.

/// Error types for every component
pub mod error;

/// Shared event and summary types
pub mod events;

/// Configuration management
pub mod config;

/// Line classification and directory scanning
pub mod collectors;

/// Summary statistics over one cycle's events
pub mod aggregator;

/// Alert decision, notifiers and dispatch
pub mod alerts;

/// JSON summary reports
pub mod reports;

/// SVG charts
pub mod visualization;

/// Analysis cycle orchestration
pub mod analysis;

/// Directory bootstrap and retention cleanup
pub mod maintenance;

/// Host resource metrics
pub mod monitoring;

/// Scheduled service loop
pub mod service;

/// Sample log generation
pub mod generator;

// Re-export commonly used types
pub use analysis::{AnalysisCycle, CycleOutcome, CycleReport};
pub use error::{
    AlertError, ConfigError, MaintenanceError, ParseError, ReportError, ScanError,
    VisualizationError,
};
pub use events::{AnalysisSummary, LogEvent, Severity};
