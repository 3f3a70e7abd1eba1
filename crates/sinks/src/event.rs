//! Cluster event types consumed by sinks.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event as KubeEvent;
use serde::{Deserialize, Serialize};

/// Event type string for warning events.
pub const EVENT_TYPE_WARNING: &str = "Warning";

/// Event type string for normal events.
pub const EVENT_TYPE_NORMAL: &str = "Normal";

/// Severity score of a `Warning` event.
pub const SEVERITY_WARNING: u8 = 2;

/// Severity score of a `Normal` event.
pub const SEVERITY_NORMAL: u8 = 1;

/// Map an event type string to its severity score.
///
/// Matching is case-sensitive; anything other than `Warning` or `Normal`
/// scores zero.
#[must_use]
pub fn severity_score(event_type: &str) -> u8 {
    match event_type {
        EVENT_TYPE_WARNING => SEVERITY_WARNING,
        EVENT_TYPE_NORMAL => SEVERITY_NORMAL,
        _ => 0,
    }
}

/// A single cluster lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Severity category, e.g. `Warning` or `Normal`
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Short, stable cause code
    #[serde(default)]
    pub reason: String,
    /// Human-readable description
    #[serde(default)]
    pub message: String,
    /// Namespace of the event
    #[serde(default)]
    pub namespace: String,
    /// Name of the object the event is about
    #[serde(default)]
    pub name: String,
    /// When the event was first observed
    #[serde(default)]
    pub first_timestamp: Option<DateTime<Utc>>,
    /// When the event was most recently observed
    #[serde(default)]
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Number of times the event occurred
    #[serde(default = "default_count")]
    pub count: i32,
}

fn default_count() -> i32 {
    1
}

impl Event {
    /// Severity score of this event's type.
    #[must_use]
    pub fn severity_score(&self) -> u8 {
        severity_score(&self.event_type)
    }

    /// The most recent timestamp known for this event.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp.or(self.first_timestamp)
    }
}

impl From<&KubeEvent> for Event {
    fn from(event: &KubeEvent) -> Self {
        let name = event
            .involved_object
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| event.metadata.name.clone())
            .unwrap_or_default();

        Self {
            event_type: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            message: event.message.clone().unwrap_or_default(),
            namespace: event.metadata.namespace.clone().unwrap_or_default(),
            name,
            first_timestamp: event.first_timestamp.as_ref().map(|t| t.0),
            last_timestamp: event
                .last_timestamp
                .as_ref()
                .map(|t| t.0)
                .or_else(|| event.event_time.as_ref().map(|t| t.0)),
            count: event.count.unwrap_or(1),
        }
    }
}

/// Events observed in one collection cycle.
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    /// When the batch was collected
    pub timestamp: DateTime<Utc>,
    /// Events in observation order
    pub events: Vec<Event>,
}

impl EventBatch {
    /// Create a batch stamped with the current time.
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            timestamp: Utc::now(),
            events,
        }
    }

    /// Number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over the events in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ObjectReference;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    #[test]
    fn test_severity_scores() {
        assert_eq!(severity_score("Warning"), 2);
        assert_eq!(severity_score("Normal"), 1);
        assert_eq!(severity_score("warning"), 0);
        assert_eq!(severity_score(""), 0);
    }

    #[test]
    fn test_from_kube_event_prefers_involved_object() {
        let first = Utc::now();
        let kube_event = KubeEvent {
            metadata: ObjectMeta {
                name: Some("pod-a.17a3f1".to_string()),
                namespace: Some("kube-system".to_string()),
                ..ObjectMeta::default()
            },
            involved_object: ObjectReference {
                name: Some("pod-a".to_string()),
                ..ObjectReference::default()
            },
            type_: Some("Warning".to_string()),
            reason: Some("BackOff".to_string()),
            message: Some("Back-off restarting failed container".to_string()),
            first_timestamp: Some(Time(first)),
            count: Some(3),
            ..KubeEvent::default()
        };

        let event = Event::from(&kube_event);
        assert_eq!(event.name, "pod-a");
        assert_eq!(event.namespace, "kube-system");
        assert_eq!(event.event_type, "Warning");
        assert_eq!(event.reason, "BackOff");
        assert_eq!(event.count, 3);
        assert_eq!(event.first_timestamp, Some(first));
        assert_eq!(event.latest_timestamp(), Some(first));
    }

    #[test]
    fn test_from_kube_event_falls_back_to_event_name() {
        let kube_event = KubeEvent {
            metadata: ObjectMeta {
                name: Some("node-1.abc".to_string()),
                ..ObjectMeta::default()
            },
            ..KubeEvent::default()
        };

        let event = Event::from(&kube_event);
        assert_eq!(event.name, "node-1.abc");
        assert_eq!(event.namespace, "");
        assert_eq!(event.message, "");
        assert_eq!(event.count, 1);
    }

    #[test]
    fn test_deserialize_event_json() {
        let event: Event = serde_json::from_str(
            r#"{"type":"Warning","namespace":"default","name":"web-0","message":"OOMKilled"}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "Warning");
        assert_eq!(event.reason, "");
        assert_eq!(event.count, 1);
        assert!(event.first_timestamp.is_none());
    }
}
