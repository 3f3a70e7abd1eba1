//! Event sources feeding the collection loop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event as KubeEvent;
use kube::{
    api::{Api, ListParams},
    Client as KubeClient,
};
use std::collections::HashSet;

use sinks::{Event, EventBatch, Fingerprint};
use tracing::debug;

/// Produces one batch of new events per call.
#[async_trait]
pub trait EventSource: Send {
    fn name(&self) -> &'static str;

    /// Events observed since the previous call.
    async fn next_batch(&mut self) -> Result<EventBatch>;
}

/// Identity of a listed event at a given timestamp.
type SeenKey = (Fingerprint, i32);

/// Keeps only events not returned before.
///
/// Event timestamps have one-second resolution, so events sharing the
/// high-water second are told apart by fingerprint and count.
#[derive(Debug, Default)]
pub struct NewEventFilter {
    high_water: Option<DateTime<Utc>>,
    /// events listed at exactly `high_water`
    seen_at_mark: HashSet<SeenKey>,
    primed: bool,
    include_existing: bool,
}

impl NewEventFilter {
    #[must_use]
    pub fn new(include_existing: bool) -> Self {
        Self {
            include_existing,
            ..Self::default()
        }
    }

    fn key(event: &Event) -> SeenKey {
        (Fingerprint::of(event), event.count)
    }

    fn is_new(&self, event: &Event) -> bool {
        match (event.latest_timestamp(), self.high_water) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(t), Some(mark)) => {
                t > mark || (t == mark && !self.seen_at_mark.contains(&Self::key(event)))
            }
        }
    }

    /// Select the new events from a full listing, oldest first.
    ///
    /// The first listing only sets the high-water mark unless existing
    /// events were asked for.
    pub fn select(&mut self, events: Vec<Event>) -> Vec<Event> {
        let newest = events.iter().filter_map(Event::latest_timestamp).max();

        let mut selected: Vec<Event> = if self.primed {
            events.iter().filter(|e| self.is_new(e)).cloned().collect()
        } else {
            self.primed = true;
            if self.include_existing {
                events.clone()
            } else {
                Vec::new()
            }
        };

        if let Some(newest) = newest {
            if self.high_water.map_or(true, |mark| newest > mark) {
                self.high_water = Some(newest);
                self.seen_at_mark.clear();
            }
            if Some(newest) == self.high_water {
                self.seen_at_mark.extend(
                    events
                        .iter()
                        .filter(|e| e.latest_timestamp() == Some(newest))
                        .map(Self::key),
                );
            }
        }

        selected.sort_by_key(Event::latest_timestamp);
        selected
    }
}

/// Lists `core/v1` events from the Kubernetes API.
pub struct KubernetesSource {
    api: Api<KubeEvent>,
    filter: NewEventFilter,
}

impl KubernetesSource {
    /// Connect using the in-cluster or kubeconfig credentials.
    pub async fn new(namespace: Option<&str>, include_existing: bool) -> Result<Self> {
        let client = KubeClient::try_default()
            .await
            .context("Failed to create Kubernetes client")?;

        let api = match namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        };

        Ok(Self {
            api,
            filter: NewEventFilter::new(include_existing),
        })
    }
}

#[async_trait]
impl EventSource for KubernetesSource {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    async fn next_batch(&mut self) -> Result<EventBatch> {
        let list = self
            .api
            .list(&ListParams::default())
            .await
            .context("Failed to list events")?;

        let listed = list.items.len();
        let events = self
            .filter
            .select(list.items.iter().map(Event::from).collect());

        debug!(listed, new = events.len(), "Listed Kubernetes events");
        Ok(EventBatch::new(events))
    }
}
