//! Per-cycle event collection and summary statistics
//!
//! The [`LogAggregator`] owns the events of one analysis cycle. It computes the
//! [`AnalysisSummary`] persisted in reports and the derived series the
//! visualizer draws.

use crate::events::{AnalysisSummary, LogEvent, Severity, Timestamp};
use chrono::{Duration, DurationRound, Timelike};
use std::collections::BTreeMap;

/// Per-severity counts, indexed in [`Severity::ALL`] order
pub type SeverityCounts = [usize; 3];

fn severity_index(severity: Severity) -> usize {
    match severity {
        Severity::Info => 0,
        Severity::Warning => 1,
        Severity::Error => 2,
    }
}

/// Compute the summary for a set of events
///
/// The result does not depend on the order of `events`. Response-time and
/// time-range statistics are `None` when no event carries the field.
pub fn aggregate(events: &[LogEvent]) -> AnalysisSummary {
    let counts = count_by_severity(events);

    let mut response_times: Vec<f64> = events.iter().filter_map(|e| e.response_time).collect();
    // Summing in sorted order keeps the mean bit-identical for any input order
    response_times.sort_by(f64::total_cmp);
    let avg_response_time = if response_times.is_empty() {
        None
    } else {
        Some(response_times.iter().sum::<f64>() / response_times.len() as f64)
    };
    let max_response_time = response_times.last().copied();

    let timestamps = events.iter().filter_map(|e| e.timestamp);
    let start_time = timestamps.clone().min();
    let end_time = timestamps.max();

    AnalysisSummary {
        total_logs: events.len(),
        error_count: counts[severity_index(Severity::Error)],
        warning_count: counts[severity_index(Severity::Warning)],
        info_count: counts[severity_index(Severity::Info)],
        avg_response_time,
        max_response_time,
        start_time,
        end_time,
    }
}

fn count_by_severity(events: &[LogEvent]) -> SeverityCounts {
    events.iter().fold([0; 3], |mut counts, event| {
        counts[severity_index(event.severity)] += 1;
        counts
    })
}

/// Collection of classified events for one analysis cycle
#[derive(Debug, Clone, Default)]
pub struct LogAggregator {
    events: Vec<LogEvent>,
}

impl LogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<LogEvent>) -> Self {
        Self { events }
    }

    pub fn add(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn extend<I: IntoIterator<Item = LogEvent>>(&mut self, events: I) {
        self.events.extend(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    /// Keep only events stamped at or after `cutoff`
    ///
    /// Events without a timestamp cannot be placed in time and are removed.
    /// Returns the number of events removed.
    pub fn retain_since(&mut self, cutoff: Timestamp) -> usize {
        let before = self.events.len();
        self.events
            .retain(|event| event.timestamp.is_some_and(|ts| ts >= cutoff));
        before - self.events.len()
    }

    /// Events with `ERROR` severity
    pub fn errors(&self) -> impl Iterator<Item = &LogEvent> {
        self.events.iter().filter(|event| event.is_error())
    }

    pub fn summarize(&self) -> AnalysisSummary {
        aggregate(&self.events)
    }

    /// Number of events per severity, including zero counts
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let counts = count_by_severity(&self.events);
        Severity::ALL
            .iter()
            .map(|&severity| (severity, counts[severity_index(severity)]))
            .collect()
    }

    /// Per-severity counts for each clock hour that has events
    pub fn hourly_timeline(&self) -> BTreeMap<Timestamp, SeverityCounts> {
        let mut timeline: BTreeMap<Timestamp, SeverityCounts> = BTreeMap::new();
        for event in &self.events {
            let Some(ts) = event.timestamp else { continue };
            let bucket = ts.duration_trunc(Duration::hours(1)).unwrap_or(ts);
            timeline.entry(bucket).or_insert([0; 3])[severity_index(event.severity)] += 1;
        }
        timeline
    }

    /// Per-severity counts by hour of day (0-23), across all dates
    pub fn hour_of_day_matrix(&self) -> [SeverityCounts; 24] {
        let mut matrix = [[0; 3]; 24];
        for event in &self.events {
            if let Some(ts) = event.timestamp {
                matrix[ts.hour() as usize][severity_index(event.severity)] += 1;
            }
        }
        matrix
    }

    /// Trailing mean of response times in timestamp order
    ///
    /// Each point averages up to `window` most recent samples, so the series
    /// starts at the first sample rather than after a full window.
    pub fn response_time_rolling_mean(&self, window: usize) -> Vec<(Timestamp, f64)> {
        let window = window.max(1);
        let mut samples: Vec<(Timestamp, f64)> = self
            .events
            .iter()
            .filter_map(|e| Some((e.timestamp?, e.response_time?)))
            .collect();
        samples.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        samples
            .iter()
            .enumerate()
            .map(|(i, &(ts, _))| {
                let start = (i + 1).saturating_sub(window);
                let slice = &samples[start..=i];
                let mean = slice.iter().map(|(_, v)| v).sum::<f64>() / slice.len() as f64;
                (ts, mean)
            })
            .collect()
    }

    /// Whether any event carries a timestamp
    pub fn has_timestamps(&self) -> bool {
        self.events.iter().any(|e| e.timestamp.is_some())
    }
}


// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn prop_counts_partition_total(events: Vec<LogEvent>) -> bool {
        let summary = aggregate(&events);
        summary.error_count + summary.warning_count + summary.info_count == summary.total_logs
            && summary.total_logs == events.len()
    }

    #[quickcheck]
    fn prop_summary_is_order_independent(
        events: Vec<LogEvent>,
        swaps: Vec<(usize, usize)>,
    ) -> TestResult {
        if events.len() < 2 {
            return TestResult::discard();
        }
        let mut shuffled = events.clone();
        let len = shuffled.len();
        for (a, b) in swaps {
            shuffled.swap(a % len, b % len);
        }
        shuffled.reverse();
        TestResult::from_bool(aggregate(&events) == aggregate(&shuffled))
    }

    #[quickcheck]
    fn prop_response_stats_absent_iff_no_samples(events: Vec<LogEvent>) -> bool {
        let summary = aggregate(&events);
        let has_samples = events.iter().any(|e| e.response_time.is_some());
        summary.avg_response_time.is_some() == has_samples
            && summary.max_response_time.is_some() == has_samples
    }

    #[quickcheck]
    fn prop_average_never_exceeds_max(events: Vec<LogEvent>) -> bool {
        let summary = aggregate(&events);
        match (summary.avg_response_time, summary.max_response_time) {
            (Some(avg), Some(max)) => avg <= max * (1.0 + 1e-12) + 1e-9,
            (None, None) => true,
            _ => false,
        }
    }
}
