//! Analysis cycle orchestration
//!
//! One [`AnalysisCycle::run_cycle`] call scans the log directory, summarizes
//! the classified events and hands the results to the optional collaborators:
//! the report writer, the visualizer and the alert manager. Failures of a
//! single file, line, chart or alert are contained; only a missing or
//! unreadable log directory fails the cycle.

use crate::aggregator::LogAggregator;
use crate::alerts::{AlertManager, DispatchStats};
use crate::collectors::{LogScanner, SkippedFile};
use crate::error::ScanError;
use crate::events::{AnalysisSummary, LogEvent, Timestamp};
use crate::reports::ReportWriter;
use crate::visualization::{ChartKind, Visualizer};
use chrono::Local;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything a completed cycle produced
#[derive(Debug)]
pub struct CycleReport {
    pub summary: AnalysisSummary,
    /// Events the summary was computed from, after the `since` filter
    pub events: Vec<LogEvent>,
    /// Written report, `None` when no writer is configured or writing failed
    pub report_path: Option<PathBuf>,
    /// Per-chart success, empty when no visualizer is configured
    pub charts: BTreeMap<ChartKind, bool>,
    /// Alert outcome, `None` when alerting is disabled
    pub alerts: Option<DispatchStats>,
    pub files_scanned: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub dropped_lines: usize,
}

/// Result of a cycle that reached the log directory
#[derive(Debug)]
pub enum CycleOutcome {
    /// No events were left to summarize; nothing was persisted or alerted
    Empty,
    Completed(CycleReport),
}

impl CycleOutcome {
    pub fn summary(&self) -> Option<&AnalysisSummary> {
        match self {
            CycleOutcome::Empty => None,
            CycleOutcome::Completed(report) => Some(&report.summary),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CycleOutcome::Empty)
    }
}

/// Orchestrates one pass over a log directory
///
/// Holds no state between cycles; every call rescans the directory.
pub struct AnalysisCycle {
    scanner: LogScanner,
    since: Option<Timestamp>,
    report_writer: Option<ReportWriter>,
    visualizer: Option<Visualizer>,
    alert_manager: Option<AlertManager>,
}

impl AnalysisCycle {
    pub fn new(scanner: LogScanner) -> Self {
        Self {
            scanner,
            since: None,
            report_writer: None,
            visualizer: None,
            alert_manager: None,
        }
    }

    /// Only summarize events stamped at or after `cutoff`
    pub fn with_since(mut self, cutoff: Timestamp) -> Self {
        self.since = Some(cutoff);
        self
    }

    pub fn with_report_writer(mut self, writer: ReportWriter) -> Self {
        self.report_writer = Some(writer);
        self
    }

    pub fn with_visualizer(mut self, visualizer: Visualizer) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    pub fn with_alert_manager(mut self, manager: AlertManager) -> Self {
        self.alert_manager = Some(manager);
        self
    }

    pub fn alerts_enabled(&self) -> bool {
        self.alert_manager.is_some()
    }

    /// Run a cycle, stamping artifacts with the current local time
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the log directory is missing or unreadable.
    pub fn run_cycle(&self, log_dir: &Path) -> Result<CycleOutcome, ScanError> {
        self.run_cycle_at(log_dir, Local::now().naive_local())
    }

    /// Run a cycle, stamping artifacts with `generated_at`
    pub fn run_cycle_at(
        &self,
        log_dir: &Path,
        generated_at: Timestamp,
    ) -> Result<CycleOutcome, ScanError> {
        info!("Starting log analysis cycle over {}", log_dir.display());

        let scan = self.scanner.scan_directory(log_dir)?;
        if !scan.skipped_files.is_empty() {
            warn!(
                "Skipped {} unreadable log files",
                scan.skipped_files.len()
            );
        }
        if scan.events.is_empty() {
            warn!("No logs found to analyze");
            return Ok(CycleOutcome::Empty);
        }

        let mut aggregator = LogAggregator::from_events(scan.events);
        if let Some(cutoff) = self.since {
            let removed = aggregator.retain_since(cutoff);
            info!("Filtered out {} events before {}", removed, cutoff);
            if aggregator.is_empty() {
                warn!("No logs found on or after {}", cutoff);
                return Ok(CycleOutcome::Empty);
            }
        }

        let summary = aggregator.summarize();
        info!(
            "Analyzed {} events ({} errors, {} warnings)",
            summary.total_logs, summary.error_count, summary.warning_count
        );

        let report_path = self.report_writer.as_ref().and_then(|writer| {
            writer
                .write_at(&summary, generated_at)
                .map_err(|e| error!("Error saving summary report: {}", e))
                .ok()
        });

        let charts = self
            .visualizer
            .as_ref()
            .map(|visualizer| visualizer.generate_all_at(&aggregator, generated_at))
            .unwrap_or_default();

        let alerts = self
            .alert_manager
            .as_ref()
            .map(|manager| manager.dispatch(aggregator.errors()));

        info!("Analysis cycle completed successfully");
        Ok(CycleOutcome::Completed(CycleReport {
            summary,
            events: aggregator.into_events(),
            report_path,
            charts,
            alerts,
            files_scanned: scan.files_scanned,
            skipped_files: scan.skipped_files,
            dropped_lines: scan.dropped_lines,
        }))
    }
}
