//! Integration tests for building sinks from command-line specifications.

mod common;

use std::sync::Arc;

use common::LogCapture;
use sinks::event::SEVERITY_WARNING;
use sinks::{AlertmanagerConfig, EventSink, LogSink, SinkError, SinkFactory, SinkUri};

fn uris(specs: &[&str]) -> Vec<SinkUri> {
    specs.iter().map(|s| SinkUri::parse(s).unwrap()).collect()
}

#[test]
fn test_cluster_and_level_round_trip() {
    let spec = "alertmanager:http://am:9093/api/v1/alerts?cluster=prod&level=Warning";
    let uri = SinkUri::parse(spec).unwrap();
    let config = AlertmanagerConfig::from_uri(&uri).unwrap();

    assert_eq!(config.level, SEVERITY_WARNING);
    assert_eq!(config.level, 2);
    assert_eq!(config.cluster, "prod");
}

#[test]
fn test_build_all_with_one_unknown_kind() {
    let sinks = SinkFactory::new().build_all(&uris(&[
        "log",
        "riemann:riemann.monitoring:5555",
        "alertmanager:am:9093?cluster=prod",
    ]));

    let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["log", "alertmanager"]);
}

#[test]
fn test_build_all_logs_one_error_naming_the_failed_spec() {
    let logs = LogCapture::default();
    let sinks = {
        let _guard = logs.install();
        SinkFactory::new().build_all(&uris(&[
            "log",
            "riemann:riemann.monitoring:5555",
            "alertmanager:am:9093?cluster=prod",
        ]))
    };
    assert_eq!(sinks.len(), 2);

    let errors = logs.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("riemann"), "{}", errors[0]);
    assert!(errors[0].contains("Failed to create sink"), "{}", errors[0]);
    let info = logs.lines_at("INFO");
    assert_eq!(info.iter().filter(|l| l.contains("Sink created")).count(), 2);
}

#[test]
fn test_build_all_with_construction_failures() {
    let sinks = SinkFactory::new().build_all(&uris(&[
        "alertmanager:am:9093",
        "alertmanager:am:9093?cluster=prod&delivery=sometimes",
        "log",
    ]));

    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].name(), "log");
}

#[test]
fn test_build_all_with_nothing_valid() {
    assert!(SinkFactory::new()
        .build_all(&uris(&["kafka:broker:9092", "gcl"]))
        .is_empty());
}

#[test]
fn test_constructor_errors_are_reported_by_build() {
    let factory = SinkFactory::new();

    let missing = factory
        .build(&SinkUri::parse("alertmanager:am?level=Warning").unwrap())
        .err()
        .unwrap();
    assert_eq!(missing.to_string(), "Missing required option: cluster");

    let unknown = factory
        .build(&SinkUri::parse("honeycomb").unwrap())
        .err()
        .unwrap();
    assert!(matches!(unknown, SinkError::UnknownSink(_)));
}

#[test]
fn test_registered_kind_participates_in_build_all() {
    let mut factory = SinkFactory::new();
    factory.register("stdout", |_uri| Ok(Arc::new(LogSink::new()) as Arc<dyn EventSink>));

    let sinks = factory.build_all(&uris(&["stdout", "log"]));
    assert_eq!(sinks.len(), 2);
}
