//! Tunables for acquiring and building snapshots.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FormatError;

/// Snapshot acquisition settings. Every field is optional in the serialized form, unknown fields
/// are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Location of the JSON topology feed, if one is used.
    pub feed_url: Option<String>,
    /// How long to wait for the reply to a single server id lookup.
    pub resolve_timeout_ms: u64,
    /// How long to wait for both the `MAP` and the `LINKS` listings to complete.
    pub acquire_timeout_ms: u64,
    /// How long a built graph may be reused.
    pub cache_ttl_ms: u64,
    /// Upper bound on the id lookups outstanding at once while building a graph.
    pub max_in_flight_resolutions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: None,
            resolve_timeout_ms: 1_000,
            acquire_timeout_ms: 10_000,
            cache_ttl_ms: 30_000,
            max_in_flight_resolutions: 4,
        }
    }
}

impl Config {
    /// Parses a configuration document, missing fields keep their defaults. The document must be
    /// a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use hopgraph::config::Config;
    ///
    /// let config = Config::from_json(r#"{ "resolve_timeout_ms": 250 }"#).unwrap();
    ///
    /// assert_eq!(config.resolve_timeout(), Duration::from_millis(250));
    /// assert_eq!(config.max_in_flight(), 4);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let fields: Map<String, Value> = serde_json::from_str(json)?;
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// At least one lookup is always allowed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight_resolutions.max(1)
    }
}
