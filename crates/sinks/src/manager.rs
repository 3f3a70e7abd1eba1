//! Fans event batches out to every configured sink.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::event::EventBatch;
use crate::sink::EventSink;

/// Default upper bound on one sink's export call.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(20);

/// Dispatches each batch to all sinks concurrently.
///
/// Sinks are independent: a slow or failing sink never delays delivery to
/// the others beyond `export_timeout`.
pub struct SinkManager {
    sinks: Vec<Arc<dyn EventSink>>,
    export_timeout: Duration,
}

impl SinkManager {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn EventSink>>, export_timeout: Duration) -> Self {
        Self {
            sinks,
            export_timeout,
        }
    }

    /// Names of the managed sinks, in order.
    #[must_use]
    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Export `batch` to every sink, waiting for all of them to finish or
    /// time out.
    pub async fn export(&self, batch: &EventBatch) {
        if batch.is_empty() {
            debug!("Empty batch, nothing to export");
            return;
        }

        let exports = self.sinks.iter().map(|sink| {
            let sink = Arc::clone(sink);
            async move {
                let name = sink.name();
                if tokio::time::timeout(self.export_timeout, sink.export_events(batch))
                    .await
                    .is_err()
                {
                    warn!(
                        sink = name,
                        timeout_secs = self.export_timeout.as_secs(),
                        "Sink export timed out"
                    );
                } else {
                    debug!(sink = name, count = batch.len(), "Export finished");
                }
            }
        });

        join_all(exports).await;
    }

    /// Stop every sink.
    pub fn stop(&self) {
        for sink in &self.sinks {
            info!(sink = sink.name(), "Stopping sink");
            sink.stop();
        }
    }
}
