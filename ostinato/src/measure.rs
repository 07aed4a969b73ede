//! Measurement type and reserved label plumbing.
//!
//! A [`Measurement`] is the unit of ingestion: a label set identifying a
//! series plus a single floating-point observation. The label set carries a
//! few reserved entries consumed by the pipeline itself — the series name,
//! an internal content hash stamped by the store, and an internal routing
//! marker — none of which appear in rendered exposition output.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Reserved label holding the series name.
pub const NAME_LABEL: &str = "__name__";

/// Reserved label holding the store-internal content hash. Stamped on
/// insert, never rendered.
pub const HASH_LABEL: &str = "_hash";

/// Reserved label marking internal routing targets. Never rendered.
pub const TARGET_LABEL: &str = "ft_target";

/// Series name substituted when a measurement arrives unnamed.
pub const DEFAULT_NAME: &str = "unnamed_metric";

/// A single reported observation: a label set plus a value.
///
/// Labels are an arbitrary name→value map; the [`NAME_LABEL`] entry
/// identifies the series. Values may be NaN on arrival — the rollup pass
/// excludes them from snapshots rather than rejecting them at ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// The label set, including reserved entries.
    pub labels: HashMap<String, String>,
    /// The observed value.
    pub value: f64,
}

impl Measurement {
    /// Creates a measurement with the given series name and value.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let mut labels = HashMap::new();
        labels.insert(NAME_LABEL.to_string(), name.into());
        Self { labels, value }
    }

    /// Adds a label, returning the measurement for chaining.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns the declared series name, if present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.labels
            .get(NAME_LABEL)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Writes the series name back into the label set.
    pub fn set_name(&mut self, name: String) {
        self.labels.insert(NAME_LABEL.to_string(), name);
    }

    /// Computes the series identity: a digest over the sorted label set,
    /// excluding the [`HASH_LABEL`] entry itself.
    ///
    /// Two measurements with equal label sets share an identity regardless
    /// of their observed values. The digest is stable within a process but
    /// not across processes — it keys in-memory generations, nothing more.
    pub fn identity(&self) -> String {
        let mut pairs: Vec<(&str, &str)> = self
            .labels
            .iter()
            .filter(|(key, _)| key.as_str() != HASH_LABEL)
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        pairs.sort_unstable();

        let mut hasher = DefaultHasher::new();
        pairs.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_present() {
        let m = Measurement::new("latency", 1.5);
        assert_eq!(m.name(), Some("latency"));
    }

    #[test]
    fn test_name_empty_is_absent() {
        let m = Measurement::new("", 1.5);
        assert_eq!(m.name(), None);
    }

    #[test]
    fn test_name_missing() {
        let m = Measurement {
            labels: HashMap::new(),
            value: 0.0,
        };
        assert_eq!(m.name(), None);
    }

    #[test]
    fn test_identity_ignores_value() {
        let a = Measurement::new("latency", 1.5).with_label("host", "a");
        let b = Measurement::new("latency", 99.0).with_label("host", "a");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_ignores_hash_label() {
        let a = Measurement::new("latency", 1.5).with_label("host", "a");
        let b = a.clone().with_label(HASH_LABEL, "deadbeef");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_distinguishes_labels() {
        let a = Measurement::new("latency", 1.5).with_label("host", "a");
        let b = Measurement::new("latency", 1.5).with_label("host", "b");
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_serde_round_trip() {
        let m = Measurement::new("latency", 1.5).with_label("host", "a");
        let json = serde_json::to_string(&m).unwrap();
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{"labels":{"__name__":"latency","host":"a"},"value":1.5}"#;
        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.name(), Some("latency"));
        assert_eq!(m.value, 1.5);
    }
}
