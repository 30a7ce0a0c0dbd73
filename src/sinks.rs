use std::cell::RefCell;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::domain::{
    Error,
    traits::{AuditEvent, AuditSink, Notification, NotificationSink, SecretHasher},
};

/// Tracing-backed notification delivery for the demo binary.
#[derive(Default, Debug)]
pub struct LogNotificationSink {}

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), Error> {
        tracing::info!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            message = %notification.message,
            "notification"
        );
        Ok(())
    }
}

/// Tracing-backed audit trail for the demo binary.
#[derive(Default, Debug)]
pub struct LogAuditSink {}

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), Error> {
        tracing::info!(
            actor = %event.actor,
            action = event.action,
            details = %event.details,
            "audit"
        );
        Ok(())
    }
}

/// Captures notifications for assertions in tests.
#[derive(Default, Debug)]
pub struct RecordingNotificationSink {
    pub sent: RefCell<Vec<Notification>>,
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: Notification) -> Result<(), Error> {
        self.sent.borrow_mut().push(notification);
        Ok(())
    }
}

/// Captures audit events for assertions in tests.
#[derive(Default, Debug)]
pub struct RecordingAuditSink {
    pub recorded: RefCell<Vec<AuditEvent>>,
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), Error> {
        self.recorded.borrow_mut().push(event);
        Ok(())
    }
}

/// Salted digest stand-in for the external secret-hashing service. Not a
/// KDF; a deployment plugs a real hashing collaborator behind the same
/// seam and nothing else changes.
#[derive(Debug, Clone, Copy)]
pub struct DigestHasher {
    salt: u64,
}

impl DigestHasher {
    pub fn new(salt: u64) -> Self {
        Self { salt }
    }
}

impl Default for DigestHasher {
    fn default() -> Self {
        Self::new(0x0c4d_155a_17ed_cafe)
    }
}

impl SecretHasher for DigestHasher {
    fn digest(&self, secret: &str) -> String {
        let mut hasher = DefaultHasher::new();
        self.salt.hash(&mut hasher);
        secret.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_never_echo_the_secret() {
        let hasher = DigestHasher::new(7);
        let digest = hasher.digest("1234");
        assert_ne!(digest, "1234");
        assert!(!digest.contains("1234"));
        assert_eq!(digest, hasher.digest("1234"));
    }

    #[test]
    fn salt_changes_the_digest() {
        assert_ne!(
            DigestHasher::new(1).digest("1234"),
            DigestHasher::new(2).digest("1234")
        );
    }
}
