//! Long-running scheduled analysis
//!
//! [`LogAnalyzerService`] runs an analysis cycle every
//! `schedule.analysis_interval_minutes` and a retention cleanup once a day at
//! `schedule.cleanup_time`, until a shutdown message arrives on its channel.

use crate::alerts::{AlertManager, EmailNotifier};
use crate::analysis::{AnalysisCycle, CycleOutcome};
use crate::collectors::{LineClassifier, LogScanner};
use crate::config::Config;
use crate::error::{ConfigError, MaintenanceError, ScanError};
use crate::events::Timestamp;
use crate::maintenance::{cleanup_files, ensure_directories, retention_period};
use crate::reports::ReportWriter;
use crate::visualization::Visualizer;
use chrono::{Duration as ChronoDuration, Local, NaiveTime};
use log::{error, info, warn};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Longest uninterrupted wait, so wall-clock changes are noticed
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Running totals since the service started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceTotals {
    pub cycles_completed: usize,
    pub cycles_empty: usize,
    pub cycles_failed: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub files_cleaned: usize,
}

/// First occurrence of the local time `at` strictly after `now`
pub fn next_cleanup_after(now: Timestamp, at: NaiveTime) -> Timestamp {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Scheduled log analyzer
pub struct LogAnalyzerService {
    config: Config,
    cycle: AnalysisCycle,
    cleanup_time: NaiveTime,
    totals: ServiceTotals,
}

impl LogAnalyzerService {
    /// Build the service and its collaborators from configuration
    ///
    /// Alerts are always enabled; without SMTP credentials they are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a pattern or the cleanup time is invalid.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let classifier = LineClassifier::new(&config.patterns)?;
        let cycle = AnalysisCycle::new(LogScanner::new(classifier))
            .with_report_writer(ReportWriter::new(&config.paths.reports_dir))
            .with_visualizer(Visualizer::new(
                &config.paths.visualizations_dir,
                config.visualization.clone(),
            ))
            .with_alert_manager(AlertManager::new(
                Box::new(EmailNotifier::new(config.smtp.clone())),
                config.thresholds.clone(),
            ));
        Self::with_cycle(config, cycle)
    }

    /// Build the service around an already assembled cycle
    pub fn with_cycle(config: Config, cycle: AnalysisCycle) -> Result<Self, ConfigError> {
        let cleanup_time = config.schedule.cleanup_time()?;
        Ok(Self {
            config,
            cycle,
            cleanup_time,
            totals: ServiceTotals::default(),
        })
    }

    pub fn totals(&self) -> ServiceTotals {
        self.totals
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.schedule.analysis_interval_minutes.max(1) * 60)
    }

    /// Run one analysis cycle and fold its outcome into the totals
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, ScanError> {
        match self.cycle.run_cycle(&self.config.paths.logs_dir) {
            Ok(outcome) => {
                match &outcome {
                    CycleOutcome::Empty => self.totals.cycles_empty += 1,
                    CycleOutcome::Completed(report) => {
                        self.totals.cycles_completed += 1;
                        if let Some(alerts) = report.alerts {
                            self.totals.alerts_sent += alerts.sent;
                            self.totals.alerts_failed += alerts.failed;
                        }
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.totals.cycles_failed += 1;
                Err(e)
            }
        }
    }

    /// Remove expired reports and charts, returning the number removed
    pub fn cleanup_old_files(&mut self) -> usize {
        let max_age = retention_period(self.config.retention.days);
        let mut removed = 0;
        for dir in [
            &self.config.paths.reports_dir,
            &self.config.paths.visualizations_dir,
        ] {
            match cleanup_files(dir, max_age) {
                Ok(count) => removed += count,
                Err(e) => error!("Error during cleanup of {}: {}", dir.display(), e),
            }
        }
        info!("Cleanup removed {} old files", removed);
        self.totals.files_cleaned += removed;
        removed
    }

    fn run_cycle_logged(&mut self) {
        if let Err(e) = self.run_cycle() {
            error!("Error in analysis cycle: {}", e);
        }
    }

    /// Run until a message arrives on `shutdown` or its sender is dropped
    ///
    /// # Errors
    ///
    /// Returns `MaintenanceError` if the working directories cannot be
    /// created. Failed cycles are logged and the loop continues.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<ServiceTotals, MaintenanceError> {
        ensure_directories(&self.config.paths)?;
        info!(
            "Starting log analyzer service (every {} minutes, cleanup at {})",
            self.config.schedule.analysis_interval_minutes, self.cleanup_time
        );

        self.run_cycle_logged();

        let mut next_cycle = Instant::now() + self.interval();
        let mut next_cleanup = next_cleanup_after(Local::now().naive_local(), self.cleanup_time);

        loop {
            let until_cleanup = (next_cleanup - Local::now().naive_local())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let wait = next_cycle
                .saturating_duration_since(Instant::now())
                .min(until_cleanup)
                .min(MAX_WAIT);

            match shutdown.recv_timeout(wait) {
                Ok(()) => {
                    info!("Shutdown requested");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Shutdown channel closed, stopping service");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            if Instant::now() >= next_cycle {
                self.run_cycle_logged();
                next_cycle = Instant::now() + self.interval();
            }

            let now = Local::now().naive_local();
            if now >= next_cleanup {
                self.cleanup_old_files();
                next_cleanup = next_cleanup_after(now, self.cleanup_time);
            }
        }

        info!(
            "Service stopped: {} cycles completed, {} empty, {} failed, {} alerts sent",
            self.totals.cycles_completed,
            self.totals.cycles_empty,
            self.totals.cycles_failed,
            self.totals.alerts_sent
        );
        Ok(self.totals)
    }
}
