//! Sink factory.
//!
//! Maps a sink kind (the part of a sink specification before the first
//! `:`) to a constructor. New kinds are added with [`SinkFactory::register`]
//! without touching the dispatch code.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::{SinkError, SinkResult};
use crate::sink::EventSink;
use crate::sinks::alertmanager::{AlertmanagerSink, ALERTMANAGER_SINK};
use crate::sinks::log::{LogSink, LOG_SINK};
use crate::uri::SinkUri;

/// Builds one sink from its specification.
pub type SinkConstructor =
    Box<dyn Fn(&SinkUri) -> SinkResult<Arc<dyn EventSink>> + Send + Sync>;

/// Registration table from sink kind to constructor.
pub struct SinkFactory {
    constructors: HashMap<String, SinkConstructor>,
}

impl SinkFactory {
    /// Factory with every built-in sink kind registered.
    #[must_use]
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register(LOG_SINK, |uri| {
            Ok(Arc::new(LogSink::from_uri(uri)?) as Arc<dyn EventSink>)
        });
        factory.register(ALERTMANAGER_SINK, |uri| {
            Ok(Arc::new(AlertmanagerSink::from_uri(uri)?) as Arc<dyn EventSink>)
        });
        factory
    }

    /// Factory with no sink kinds.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for a sink kind.
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn(&SinkUri) -> SinkResult<Arc<dyn EventSink>> + Send + Sync + 'static,
    {
        self.constructors.insert(key.into(), Box::new(constructor));
    }

    /// Registered sink kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the sink described by `uri`.
    pub fn build(&self, uri: &SinkUri) -> SinkResult<Arc<dyn EventSink>> {
        let constructor = self
            .constructors
            .get(uri.key())
            .ok_or_else(|| SinkError::UnknownSink(uri.key().to_string()))?;
        constructor(uri)
    }

    /// Build every sink in `uris`, skipping (and logging) the ones that fail.
    ///
    /// Successfully built sinks keep their relative order.
    pub fn build_all(&self, uris: &[SinkUri]) -> Vec<Arc<dyn EventSink>> {
        let mut sinks = Vec::with_capacity(uris.len());

        for uri in uris {
            match self.build(uri) {
                Ok(sink) => {
                    info!(sink = sink.name(), "Sink created");
                    sinks.push(sink);
                }
                Err(e) => {
                    error!(spec = %uri, error = %e, "Failed to create sink");
                }
            }
        }

        sinks
    }
}

impl Default for SinkFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SinkFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkFactory")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(spec: &str) -> SinkUri {
        SinkUri::parse(spec).unwrap()
    }

    #[test]
    fn test_builtin_kinds() {
        let factory = SinkFactory::new();
        assert_eq!(factory.kinds(), vec!["alertmanager", "log"]);
        assert!(SinkFactory::empty().kinds().is_empty());
    }

    #[test]
    fn test_build_known_kinds() {
        let factory = SinkFactory::new();
        assert_eq!(factory.build(&uri("log")).unwrap().name(), "log");
        assert_eq!(
            factory
                .build(&uri("alertmanager:am:9093?cluster=prod"))
                .unwrap()
                .name(),
            "alertmanager"
        );
    }

    #[test]
    fn test_build_unknown_kind() {
        let err = SinkFactory::new().build(&uri("carrier-pigeon")).err().unwrap();
        assert!(matches!(err, SinkError::UnknownSink(ref key) if key == "carrier-pigeon"));
        assert_eq!(err.to_string(), "Sink not recognized: carrier-pigeon");
    }

    #[test]
    fn test_build_propagates_construction_error() {
        let err = SinkFactory::new()
            .build(&uri("alertmanager:am:9093"))
            .err()
            .unwrap();
        assert!(matches!(err, SinkError::MissingOption("cluster")));
    }

    #[test]
    fn test_build_all_skips_failures_and_keeps_order() {
        let factory = SinkFactory::new();
        let uris = vec![
            uri("alertmanager:am:9093?cluster=prod"),
            uri("influxdb:monitoring-influxdb:8086"),
            uri("log"),
        ];

        let sinks = factory.build_all(&uris);
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alertmanager", "log"]);
    }

    #[test]
    fn test_register_custom_kind() {
        let mut factory = SinkFactory::empty();
        factory.register("stdout", |_uri| Ok(Arc::new(LogSink::new()) as Arc<dyn EventSink>));

        assert_eq!(factory.kinds(), vec!["stdout"]);
        assert!(factory.build(&uri("stdout")).is_ok());
        assert!(matches!(
            factory.build(&uri("log")).err(),
            Some(SinkError::UnknownSink(_))
        ));
    }
}
