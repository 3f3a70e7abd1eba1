//! Alertmanager alert objects built from cluster events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AlertError;
use crate::event::Event;

/// Label holding the alert's name.
pub const ALERT_NAME_LABEL: &str = "alertname";
pub const ALERT_CLUSTER_LABEL: &str = "cluster";
pub const ALERT_GROUP_LABEL: &str = "group";
pub const ALERT_LEVEL_LABEL: &str = "level";
pub const ALERT_INSTANCE_LABEL: &str = "instance";
pub const ALERT_REASON_LABEL: &str = "reason";

/// A generic representation of an alert in the Prometheus ecosystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Label value pairs used for aggregation, matching and routing.
    /// Always contains `alertname` and `cluster`.
    pub labels: BTreeMap<String, String>,

    /// Extra key/value information which does not define alert identity.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl Alert {
    /// Build an alert for `event`, labelled with `cluster`.
    ///
    /// The event message becomes the alert name, so an event without one is
    /// rejected. Optional labels are left out when their source is empty.
    pub fn from_event(cluster: &str, event: &Event) -> Result<Self, AlertError> {
        if event.message.is_empty() {
            return Err(AlertError::EmptyAlertName);
        }

        let mut labels = BTreeMap::new();
        labels.insert(ALERT_NAME_LABEL.to_string(), event.message.clone());

        if !event.namespace.is_empty() {
            labels.insert(
                ALERT_GROUP_LABEL.to_string(),
                event.namespace.to_uppercase(),
            );
        }
        if !event.event_type.is_empty() {
            labels.insert(ALERT_LEVEL_LABEL.to_string(), event.event_type.clone());
        }
        if !event.name.is_empty() {
            labels.insert(ALERT_INSTANCE_LABEL.to_string(), event.name.clone());
        }
        if !event.reason.is_empty() {
            labels.insert(ALERT_REASON_LABEL.to_string(), event.reason.clone());
        }

        labels.insert(ALERT_CLUSTER_LABEL.to_string(), cluster.to_string());

        Ok(Self {
            labels,
            annotations: BTreeMap::new(),
        })
    }

    /// The alert name label.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels
            .get(ALERT_NAME_LABEL)
            .map_or("", String::as_str)
    }
}
