/// Alert predicate over single events
pub mod alert_decision;
/// Alert dispatch and the notifier seam
pub mod alert_manager;
/// SMTP email delivery
pub mod email_notifier;

pub use alert_decision::should_alert;
pub use alert_manager::{AlertManager, DispatchStats, Notifier};
pub use email_notifier::EmailNotifier;

#[cfg(test)]
pub use alert_manager::MockNotifier;
