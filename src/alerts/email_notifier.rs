use crate::alerts::Notifier;
use crate::config::SmtpConfig;
use crate::error::AlertError;
use crate::events::{LogEvent, Timestamp, TIMESTAMP_FORMAT};
use chrono::Local;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;
use std::time::Duration;

/// Connection and command timeout for the SMTP session
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers alerts as plain-text email over SMTP with STARTTLS
pub struct EmailNotifier {
    config: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the alert email for `event`, stamping the subject with `now`
    ///
    /// # Errors
    ///
    /// Returns `AlertError::MessageError` if the configured addresses are not
    /// valid mailboxes.
    pub fn build_message(&self, event: &LogEvent, now: Timestamp) -> Result<Message, AlertError> {
        let from: Mailbox = self.config.from_email.parse().map_err(|e| {
            AlertError::MessageError(format!("from address '{}': {}", self.config.from_email, e))
        })?;
        let to: Mailbox = self.config.to_email.parse().map_err(|e| {
            AlertError::MessageError(format!("to address '{}': {}", self.config.to_email, e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(Self::subject(now))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::body(event))
            .map_err(|e| AlertError::MessageError(e.to_string()))
    }

    fn subject(now: Timestamp) -> String {
        format!(
            "CRITICAL ALERT: Log Analysis Alert - {}",
            now.format(TIMESTAMP_FORMAT)
        )
    }

    /// Plain-text body listing the event's fields, `N/A` for absent ones
    fn body(event: &LogEvent) -> String {
        let time = event
            .timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let response_time = event
            .response_time
            .map(|rt| rt.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "Critical Alert from Log Analyzer\n\n\
             Time: {}\n\
             Severity: {}\n\
             Message: {}\n\n\
             Additional Information:\n\
             - Response Time: {} ms\n",
            time, event.severity, event.message, response_time
        )
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn notify(&self, event: &LogEvent) -> Result<(), AlertError> {
        if !self.config.has_credentials() {
            return Err(AlertError::NotConfigured(
                "SMTP credentials not configured".to_string(),
            ));
        }

        let message = self.build_message(event, Local::now().naive_local())?;

        let transport = SmtpTransport::starttls_relay(&self.config.server)
            .map_err(|e| {
                AlertError::NotificationFailed(format!(
                    "SMTP relay {}: {}",
                    self.config.server, e
                ))
            })?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(&message)
            .map_err(|e| AlertError::NotificationFailed(e.to_string()))?;

        info!(
            "Alert sent successfully for error at {}",
            event
                .timestamp
                .map(|ts| ts.to_string())
                .unwrap_or_else(|| "unknown time".to_string())
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::event_at;
    use crate::events::Severity;

    fn configured() -> SmtpConfig {
        SmtpConfig {
            username: "alerts".to_string(),
            password: "secret".to_string(),
            from_email: "alerts@example.com".to_string(),
            to_email: "oncall@example.com".to_string(),
            ..SmtpConfig::default()
        }
    }

    #[test]
    fn test_missing_credentials_is_not_configured() {
        let notifier = EmailNotifier::new(SmtpConfig::default());
        let event = event_at(1, 0, Severity::Error, None);
        assert!(matches!(
            notifier.notify(&event),
            Err(AlertError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_body_lists_fields() {
        let event = event_at(1, 17, Severity::Error, Some(8000.0));
        let body = EmailNotifier::body(&event);
        assert!(body.contains("Time: 2024-03-12 01:17:00"));
        assert!(body.contains("Severity: ERROR"));
        assert!(body.contains("Message: ERROR test message"));
        assert!(body.contains("- Response Time: 8000 ms"));
    }

    #[test]
    fn test_body_marks_absent_fields() {
        let mut event = event_at(1, 17, Severity::Error, None);
        event.timestamp = None;
        let body = EmailNotifier::body(&event);
        assert!(body.contains("Time: N/A"));
        assert!(body.contains("- Response Time: N/A ms"));
    }

    #[test]
    fn test_build_message_headers() {
        let notifier = EmailNotifier::new(configured());
        let event = event_at(1, 17, Severity::Error, Some(8000.0));
        let now = event.timestamp.unwrap();

        let message = notifier.build_message(&event, now).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: CRITICAL ALERT: Log Analysis Alert - 2024-03-12 01:17:00"));
        assert!(raw.contains("To: oncall@example.com"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let notifier = EmailNotifier::new(SmtpConfig {
            to_email: "not an address".to_string(),
            ..configured()
        });
        let event = event_at(1, 17, Severity::Error, None);
        let now = event.timestamp.unwrap();
        assert!(matches!(
            notifier.build_message(&event, now),
            Err(AlertError::MessageError(_))
        ));
    }
}
