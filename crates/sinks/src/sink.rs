//! The contract every event backend implements.

use async_trait::async_trait;

use crate::event::EventBatch;

/// A destination for cluster events (Alertmanager, logs, etc.).
///
/// `export_events` reports nothing back to the caller: each sink logs and
/// absorbs its own failures so that one backend can never stall another.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Constant identifier of this sink kind.
    fn name(&self) -> &'static str;

    /// Deliver one batch of events.
    async fn export_events(&self, batch: &EventBatch);

    /// Release held resources. Must be safe to call more than once.
    fn stop(&self);
}
