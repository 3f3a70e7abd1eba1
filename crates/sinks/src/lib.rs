//! Pluggable sinks for Kubernetes cluster events.
//!
//! A collector periodically gathers an [`EventBatch`] and hands it to a
//! [`SinkManager`], which fans it out to every configured [`EventSink`].
//! Sinks are built once at startup by the [`SinkFactory`] from
//! specifications such as:
//!
//! ```text
//! log
//! alertmanager:http://alertmanager:9093/api/v1/alerts?cluster=prod&level=Warning
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use sinks::{EventBatch, SinkFactory, SinkManager, SinkUri};
//!
//! # async fn run() -> Result<(), sinks::SinkError> {
//! let uris = vec![SinkUri::parse("alertmanager:am:9093/api/v1/alerts?cluster=prod")?];
//! let sinks = SinkFactory::new().build_all(&uris);
//! let manager = SinkManager::new(sinks, Duration::from_secs(20));
//!
//! manager.export(&EventBatch::new(vec![])).await;
//! manager.stop();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`EventSink`] is the contract every backend implements
//! - [`SinkFactory`] maps a sink kind to its constructor
//! - [`AlertmanagerSink`] filters events by severity and reason, suppresses
//!   repeats through a [`DedupCache`], and POSTs [`Alert`]s
//! - [`LogSink`] writes events to the process log

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod dedup;
pub mod error;
pub mod event;
pub mod manager;
pub mod registry;
pub mod sink;
pub mod sinks;
pub mod uri;

pub use alert::Alert;
pub use dedup::{Clock, DedupCache, Fingerprint, ManualClock, SystemClock};
pub use error::{AlertError, DeliveryError, SinkError, SinkResult};
pub use event::{Event, EventBatch};
pub use manager::SinkManager;
pub use registry::{SinkConstructor, SinkFactory};
pub use sink::EventSink;
pub use sinks::{AlertmanagerConfig, AlertmanagerSink, DeliveryMode, LogSink};
pub use uri::SinkUri;
