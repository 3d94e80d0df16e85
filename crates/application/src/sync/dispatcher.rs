//! Typed enrollment event dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use lmsforce_domain::{EnrollmentEvent, ExecutionContext};
use serde::Serialize;

use super::enrollment_sync::SyncOutcome;

/// Something that reacts to course access updates.
#[async_trait]
pub trait EnrollmentSubscriber: Send + Sync {
    /// Stable name used in logs and dispatch reports.
    fn name(&self) -> &'static str;

    /// Handles one event. Failures are absorbed into the outcome.
    async fn handle(&self, event: &EnrollmentEvent, context: ExecutionContext) -> SyncOutcome;
}

/// Outcome of one subscriber for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    /// Subscriber name.
    pub subscriber: &'static str,
    /// What the subscriber did.
    pub outcome: SyncOutcome,
}

/// Fans enrollment events out to registered subscribers, in registration order.
#[derive(Default, Clone)]
pub struct EnrollmentDispatcher {
    subscribers: Vec<Arc<dyn EnrollmentSubscriber>>,
}

impl EnrollmentDispatcher {
    /// Creates a dispatcher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber.
    pub fn register(&mut self, subscriber: Arc<dyn EnrollmentSubscriber>) {
        tracing::debug!(subscriber = subscriber.name(), "Registered enrollment subscriber");
        self.subscribers.push(subscriber);
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers an event to every subscriber, awaiting each in turn.
    pub async fn dispatch(
        &self,
        event: &EnrollmentEvent,
        context: ExecutionContext,
    ) -> Vec<DispatchReport> {
        let mut reports = Vec::with_capacity(self.subscribers.len());
        for subscriber in &self.subscribers {
            let outcome = subscriber.handle(event, context).await;
            reports.push(DispatchReport {
                subscriber: subscriber.name(),
                outcome,
            });
        }
        reports
    }
}

impl std::fmt::Debug for EnrollmentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("EnrollmentDispatcher")
            .field("subscribers", &names)
            .finish()
    }
}
