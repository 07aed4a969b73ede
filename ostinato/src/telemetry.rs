//! Internal process metrics for the aggregation pipeline itself.
//!
//! One [`Telemetry`] instance owns its own `prometheus::Registry`;
//! instruments are plain fields registered once at construction, so two
//! aggregators in one process never trample each other's registrations.
//! The registry is text-encoded into the exposition output ahead of the
//! aggregated snapshot.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::Result;

/// Error-counter kind for NaN observations skipped during rollup.
pub const ERROR_KIND_NAN: &str = "nan_value";

/// Error-counter kind for registry encoding failures.
pub const ERROR_KIND_ENCODE: &str = "encode";

/// Comment line separating internal metrics from the aggregated snapshot.
const PROCESS_HEADER: &str = "# ostinato process metrics\n";

/// Internal instruments tracking the pipeline's own behavior.
pub struct Telemetry {
    registry: Registry,
    /// Exposition requests served.
    pub requests: IntCounter,
    /// Byte length of each combined exposition response.
    pub return_size: Histogram,
    /// Series count of each published snapshot.
    pub snapshot_series: Histogram,
    /// Processing errors by kind.
    pub errors: IntCounterVec,
}

impl Telemetry {
    /// Creates the registry and registers every instrument.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OstinatoError::Telemetry`] if an instrument cannot
    /// be constructed or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounter::new("ostinato_requests_total", "Exposition requests served")?;
        let return_size = Histogram::with_opts(
            HistogramOpts::new(
                "ostinato_return_size_bytes",
                "Byte length of served exposition output",
            )
            .buckets(prometheus::exponential_buckets(64.0, 4.0, 10)?),
        )?;
        let snapshot_series = Histogram::with_opts(
            HistogramOpts::new(
                "ostinato_snapshot_series",
                "Series count per published snapshot",
            )
            .buckets(prometheus::exponential_buckets(1.0, 4.0, 8)?),
        )?;
        let errors = IntCounterVec::new(
            Opts::new("ostinato_errors_total", "Processing errors by kind"),
            &["kind"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(return_size.clone()))?;
        registry.register(Box::new(snapshot_series.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            requests,
            return_size,
            snapshot_series,
            errors,
        })
    }

    /// Gathers the registry and appends its text encoding to `buf`.
    ///
    /// Encoding failures are swallowed: the failure is counted and traced,
    /// and whatever was encoded before it still lands in `buf`.
    pub fn encode_into(&self, buf: &mut String) {
        buf.push_str(PROCESS_HEADER);

        let families = self.registry.gather();
        let mut encoded = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&families, &mut encoded) {
            self.errors.with_label_values(&[ERROR_KIND_ENCODE]).inc();
            tracing::debug!("registry encode failed: {e}");
        }
        buf.push_str(&String::from_utf8_lossy(&encoded));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_registered_families() {
        let telemetry = Telemetry::new().unwrap();
        telemetry.requests.inc();
        telemetry.return_size.observe(1024.0);
        telemetry.snapshot_series.observe(3.0);
        telemetry.errors.with_label_values(&[ERROR_KIND_NAN]).inc();

        let mut out = String::new();
        telemetry.encode_into(&mut out);

        assert!(out.starts_with(PROCESS_HEADER));
        assert!(out.contains("ostinato_requests_total 1"));
        assert!(out.contains("ostinato_return_size_bytes"));
        assert!(out.contains("ostinato_snapshot_series"));
        assert!(out.contains("ostinato_errors_total{kind=\"nan_value\"} 1"));
    }

    #[test]
    fn test_instances_do_not_share_registries() {
        let a = Telemetry::new().unwrap();
        let b = Telemetry::new().unwrap();
        a.requests.inc();

        let mut out = String::new();
        b.encode_into(&mut out);
        assert!(out.contains("ostinato_requests_total 0"));
    }
}
