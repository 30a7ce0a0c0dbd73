use chrono::Utc;

use crate::config::CoreConfig;
use crate::domain::Principal;
use crate::domain::traits::{
    AuditEvent, AuditSink, InsightGenerator, Notification, NotificationSink, SecretHasher,
    Store,
};

/// Explicit dependency bundle handed to every workflow and ledger
/// operation. Constructed once at process start; there is no ambient
/// global state anywhere in the crate.
pub struct Context<S, N, A> {
    pub store: S,
    pub notifications: N,
    pub audit: A,
    pub hasher: Box<dyn SecretHasher>,
    /// External text-generation service; `None` (or any failure) routes
    /// insight requests to the rule-based fallback.
    pub insights: Option<Box<dyn InsightGenerator>>,
    pub config: CoreConfig,
}

impl<S, N, A> Context<S, N, A>
where
    S: Store,
    N: NotificationSink,
    A: AuditSink,
{
    pub fn new(store: S, notifications: N, audit: A, hasher: Box<dyn SecretHasher>) -> Self {
        Self {
            store,
            notifications,
            audit,
            hasher,
            insights: None,
            config: CoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_insights(mut self, insights: Box<dyn InsightGenerator>) -> Self {
        self.insights = Some(insights);
        self
    }

    /// Fire-and-forget delivery. A sink failure is logged and swallowed;
    /// it never rolls back the transition that produced the event.
    pub(crate) fn notify(&self, notification: Notification) {
        if let Err(error) = self.notifications.notify(notification) {
            tracing::warn!(%error, "notification sink failed, event dropped");
        }
    }

    pub(crate) fn record_audit(
        &self,
        actor: Principal,
        action: &'static str,
        details: serde_json::Value,
    ) {
        let event = AuditEvent {
            actor,
            action,
            details,
            at: Utc::now(),
        };
        if let Err(error) = self.audit.record(event) {
            tracing::warn!(%error, "audit sink failed, event dropped");
        }
    }
}
