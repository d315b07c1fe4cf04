use crate::config::AlertThresholds;
use crate::events::{LogEvent, Severity};

/// Decide whether an event warrants a notification
///
/// Error events always alert. Any other event alerts only when its response
/// time is present and strictly above `thresholds.response_time`. The
/// `error_count` threshold is not consulted; each call is independent.
pub fn should_alert(event: &LogEvent, thresholds: &AlertThresholds) -> bool {
    if event.severity == Severity::Error {
        return true;
    }
    event
        .response_time
        .is_some_and(|response_time| response_time > thresholds.response_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::event_at;
    use quickcheck_macros::quickcheck;

    fn thresholds() -> AlertThresholds {
        AlertThresholds::default()
    }

    #[test]
    fn test_error_always_alerts() {
        let event = event_at(1, 0, Severity::Error, None);
        assert!(should_alert(&event, &thresholds()));

        let fast = event_at(1, 0, Severity::Error, Some(1.0));
        assert!(should_alert(&fast, &thresholds()));
    }

    #[test]
    fn test_slow_warning_alerts() {
        let event = event_at(1, 0, Severity::Warning, Some(5000.1));
        assert!(should_alert(&event, &thresholds()));
    }

    #[test]
    fn test_threshold_is_strict() {
        let event = event_at(1, 0, Severity::Info, Some(5000.0));
        assert!(!should_alert(&event, &thresholds()));
    }

    #[test]
    fn test_absent_response_time_does_not_alert() {
        let event = event_at(1, 0, Severity::Warning, None);
        assert!(!should_alert(&event, &thresholds()));
    }

    #[test]
    fn test_error_count_threshold_is_ignored() {
        let strict = AlertThresholds {
            error_count: 0,
            ..AlertThresholds::default()
        };
        let event = event_at(1, 0, Severity::Info, Some(10.0));
        assert!(!should_alert(&event, &strict));
    }

    #[quickcheck]
    fn prop_errors_alert_for_any_threshold(threshold: u32, response_time: Option<u32>) -> bool {
        let thresholds = AlertThresholds {
            response_time: f64::from(threshold),
            ..AlertThresholds::default()
        };
        let event = event_at(0, 0, Severity::Error, response_time.map(f64::from));
        should_alert(&event, &thresholds)
    }

    #[quickcheck]
    fn prop_non_errors_alert_only_above_threshold(
        threshold: u32,
        response_time: Option<u32>,
        warning: bool,
    ) -> bool {
        let thresholds = AlertThresholds {
            response_time: f64::from(threshold),
            ..AlertThresholds::default()
        };
        let severity = if warning {
            Severity::Warning
        } else {
            Severity::Info
        };
        let event = event_at(0, 0, severity, response_time.map(f64::from));
        let expected = response_time.is_some_and(|rt| rt > threshold);
        should_alert(&event, &thresholds) == expected
    }
}
