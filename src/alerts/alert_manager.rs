use crate::alerts::should_alert;
use crate::config::AlertThresholds;
use crate::error::AlertError;
use crate::events::LogEvent;
use log::{debug, error, info, warn};

/// Delivery channel for a single alert
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Deliver one alert
    ///
    /// Returns `AlertError::NotConfigured` when the channel lacks the
    /// credentials it needs; the manager counts that as skipped.
    fn notify(&self, event: &LogEvent) -> Result<(), AlertError>;
}

/// Outcome of dispatching alerts for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events the alert decision was applied to
    pub evaluated: usize,
    /// Alerts delivered
    pub sent: usize,
    /// Alerts not attempted because the notifier is not configured
    pub skipped: usize,
    /// Alerts whose delivery failed
    pub failed: usize,
}

impl DispatchStats {
    /// Number of events the alert decision selected
    pub fn triggered(&self) -> usize {
        self.sent + self.skipped + self.failed
    }
}

/// Applies the alert decision to events and dispatches through a notifier
///
/// Dispatch is sequential. A failure for one event is logged and counted, and
/// never stops the remaining events from being evaluated.
pub struct AlertManager {
    notifier: Box<dyn Notifier>,
    thresholds: AlertThresholds,
}

impl AlertManager {
    pub fn new(notifier: Box<dyn Notifier>, thresholds: AlertThresholds) -> Self {
        Self {
            notifier,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Evaluate and dispatch alerts for each event
    pub fn dispatch<'a, I>(&self, events: I) -> DispatchStats
    where
        I: IntoIterator<Item = &'a LogEvent>,
    {
        let mut stats = DispatchStats::default();

        for event in events {
            stats.evaluated += 1;
            if !should_alert(event, &self.thresholds) {
                debug!("No alert needed for: {}", event.message);
                continue;
            }

            match self.notifier.notify(event) {
                Ok(()) => stats.sent += 1,
                Err(AlertError::NotConfigured(reason)) => {
                    warn!("{}. Skipping alert via {}", reason, self.notifier.name());
                    stats.skipped += 1;
                }
                Err(e) => {
                    error!("Failed to send alert via {}: {}", self.notifier.name(), e);
                    stats.failed += 1;
                }
            }
        }

        if stats.triggered() > 0 {
            info!(
                "Alert dispatch via {}: {} sent, {} skipped, {} failed",
                self.notifier.name(),
                stats.sent,
                stats.skipped,
                stats.failed
            );
        }
        stats
    }
}
