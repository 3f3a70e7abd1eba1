//! Integration tests for the log sink's output.

mod common;

use common::LogCapture;
use sinks::{Event, EventBatch, EventSink, LogSink};

fn backoff() -> Event {
    Event {
        event_type: "Warning".to_string(),
        namespace: "default".to_string(),
        name: "web-0".to_string(),
        message: "Back-off restarting failed container".to_string(),
        reason: "BackOff".to_string(),
        count: 4,
        ..Event::default()
    }
}

#[tokio::test]
async fn test_one_line_per_event_with_its_fields() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    LogSink::new()
        .export_events(&EventBatch::new(vec![backoff(), Event::default()]))
        .await;

    let lines = logs.lines_at("INFO");
    assert_eq!(lines.len(), 3, "{lines:?}");
    assert!(lines[0].contains("Exporting events"));
    assert!(lines[0].contains("count=2"));

    let line = &lines[1];
    assert!(line.contains("Event"), "{line}");
    assert!(line.contains("event_type=Warning"), "{line}");
    assert!(line.contains("namespace=default"), "{line}");
    assert!(line.contains("name=web-0"), "{line}");
    assert!(line.contains("reason=BackOff"), "{line}");
    assert!(line.contains("count=4"), "{line}");
    assert!(line.contains("text=Back-off restarting failed container"), "{line}");
}

#[tokio::test]
async fn test_empty_batch_logs_only_the_summary() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    LogSink::new().export_events(&EventBatch::default()).await;

    let lines = logs.lines_at("INFO");
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("count=0"));
}
