//! Error types for the sink layer.

use thiserror::Error;

/// Errors that can occur while constructing a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No sink kind is registered under this key
    #[error("Sink not recognized: {0}")]
    UnknownSink(String),

    /// The sink specification could not be parsed
    #[error("Invalid sink specification `{spec}`: {reason}")]
    InvalidUri { spec: String, reason: String },

    /// A required option was not supplied
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    /// An option was supplied with a value the sink does not understand
    #[error("Invalid value `{value}` for option `{option}`")]
    InvalidOption { option: &'static str, value: String },
}

/// Errors that can occur while turning an event into an alert.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlertError {
    /// The event has no message to use as the alert name
    #[error("not valid alert name")]
    EmptyAlertName,
}

/// Errors that can occur while delivering alerts.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for sink construction.
pub type SinkResult<T> = Result<T, SinkError>;
