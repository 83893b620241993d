//! Outbound email notifications for significant events, behind a trait so
//! the control loop and pipeline never touch an SMTP socket in tests.

use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};

use crate::error::{Result, TelemetryError};

const SUBJECT_PREFIX: &str = "[rangekeeper]";

#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: format!("{SUBJECT_PREFIX} {}", subject.into()),
            body: body.into(),
        }
    }
}

pub trait Alerter: Send + Sync {
    fn send(&self, message: &AlertMessage) -> Result<()>;
}

/// SMTP credentials read from `EMAIL_USER`/`EMAIL_PASS`/`EMAIL_TO`/`EMAIL_SERVICE`.
/// Any variable missing means alerting is disabled for the process lifetime.
pub struct SmtpAlerter {
    transport: SmtpTransport,
    from: String,
    to: String,
}

impl SmtpAlerter {
    pub fn from_env() -> Option<Self> {
        let user = std::env::var("EMAIL_USER").ok()?;
        let pass = std::env::var("EMAIL_PASS").ok()?;
        let to = std::env::var("EMAIL_TO").ok()?;
        let relay = std::env::var("EMAIL_SERVICE").ok()?;

        let creds = Credentials::new(user.clone(), pass);
        let transport = SmtpTransport::relay(&relay).ok()?.credentials(creds).build();

        Some(Self {
            transport,
            from: user,
            to,
        })
    }
}

impl Alerter for SmtpAlerter {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|e| TelemetryError::Alert(format!("{e}")))?)
            .to(self.to.parse().map_err(|e| TelemetryError::Alert(format!("{e}")))?)
            .subject(message.subject.clone())
            .body(message.body.clone())
            .map_err(|e| TelemetryError::Alert(e.to_string()))?;

        self.transport
            .send(&email)
            .map_err(|e| TelemetryError::Alert(e.to_string()))?;
        Ok(())
    }
}

/// Used when SMTP environment variables aren't configured. Logs instead of
/// failing the caller, since alerting is an observability concern, not a
/// correctness one.
pub struct NoOpAlerter;

impl Alerter for NoOpAlerter {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        tracing::warn!(subject = %message.subject, "alerting disabled, dropping message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_message_subject_is_prefixed() {
        let msg = AlertMessage::new("TWAP violation", "details here");
        assert_eq!(msg.subject, "[rangekeeper] TWAP violation");
    }

    #[test]
    fn no_op_alerter_never_fails() {
        let alerter = NoOpAlerter;
        let result = alerter.send(&AlertMessage::new("test", "body"));
        assert!(result.is_ok());
    }

    #[test]
    fn from_env_returns_none_when_unconfigured() {
        for var in ["EMAIL_USER", "EMAIL_PASS", "EMAIL_TO", "EMAIL_SERVICE"] {
            std::env::remove_var(var);
        }
        assert!(SmtpAlerter::from_env().is_none());
    }
}
