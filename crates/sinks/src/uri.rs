//! Sink specifications of the form `<key>[:<url>]`.
//!
//! ```text
//! log
//! alertmanager:http://alertmanager:9093/api/v1/alerts?cluster=prod&level=Warning
//! ```

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{SinkError, SinkResult};

/// A parsed sink specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkUri {
    key: String,
    value: Option<Url>,
    /// Port as written; `Url` forgets ports equal to the scheme default
    port: Option<u16>,
}

impl SinkUri {
    /// Parse a sink specification.
    pub fn parse(spec: &str) -> SinkResult<Self> {
        let spec = spec.trim();
        let (key, raw_value) = match spec.split_once(':') {
            Some((key, value)) => (key, Some(value)),
            None => (spec, None),
        };

        if key.is_empty() {
            return Err(SinkError::InvalidUri {
                spec: spec.to_string(),
                reason: "missing sink name".to_string(),
            });
        }

        let mut port = None;
        let value = match raw_value.filter(|v| !v.is_empty()) {
            None => None,
            Some(raw) => {
                let absolute = if raw.contains("://") {
                    raw.to_string()
                } else {
                    format!("http://{raw}")
                };
                let url = Url::parse(&absolute).map_err(|e| SinkError::InvalidUri {
                    spec: spec.to_string(),
                    reason: e.to_string(),
                })?;
                port = url.port().or_else(|| written_port(&absolute));
                Some(url)
            }
        };

        Ok(Self {
            key: key.to_string(),
            value,
            port,
        })
    }

    /// Sink kind, e.g. `alertmanager`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sink-specific configuration, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Url> {
        self.value.as_ref()
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.value.as_ref().and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        })
    }

    /// Every value of a query parameter, in order.
    #[must_use]
    pub fn query_all(&self, name: &str) -> Vec<String> {
        self.value
            .as_ref()
            .map(|url| {
                url.query_pairs()
                    .filter(|(k, _)| k == name)
                    .map(|(_, v)| v.into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `host[:port][path]` of the value, or `None` when there is no host.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        let url = self.value.as_ref()?;
        let host = url.host_str().filter(|h| !h.is_empty())?;

        let mut endpoint = host.to_string();
        if let Some(port) = self.port {
            endpoint.push(':');
            endpoint.push_str(&port.to_string());
        }
        if url.path() != "/" {
            endpoint.push_str(url.path());
        }
        Some(endpoint)
    }
}

/// Port in the authority of an absolute URL, if one is spelled out.
fn written_port(absolute: &str) -> Option<u16> {
    let (_, rest) = absolute.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let port = if host_port.starts_with('[') {
        host_port.split_once("]:")?.1
    } else {
        host_port.rsplit_once(':')?.1
    };
    port.parse().ok()
}

impl FromStr for SinkUri {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SinkUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(url) => write!(f, "{}:{url}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}
