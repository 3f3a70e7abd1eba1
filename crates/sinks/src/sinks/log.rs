//! Sink that writes events to the process log.

use async_trait::async_trait;
use tracing::info;

use crate::error::SinkResult;
use crate::event::EventBatch;
use crate::sink::EventSink;
use crate::uri::SinkUri;

/// Name of the log sink kind.
pub const LOG_SINK: &str = "log";

/// Logs every event at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The log sink takes no options; anything in the value is ignored.
    pub fn from_uri(_uri: &SinkUri) -> SinkResult<Self> {
        Ok(Self)
    }
}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &'static str {
        LOG_SINK
    }

    async fn export_events(&self, batch: &EventBatch) {
        info!(
            sink = LOG_SINK,
            count = batch.len(),
            timestamp = %batch.timestamp,
            "Exporting events"
        );

        for event in batch {
            info!(
                sink = LOG_SINK,
                event_type = %event.event_type,
                namespace = %event.namespace,
                name = %event.name,
                reason = %event.reason,
                count = event.count,
                text = %event.message,
                "Event"
            );
        }
    }

    fn stop(&self) {}
}
