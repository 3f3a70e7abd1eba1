//! Built-in sink implementations.

pub mod alertmanager;
pub mod log;

pub use alertmanager::{AlertmanagerConfig, AlertmanagerSink, DeliveryMode};
pub use log::LogSink;
