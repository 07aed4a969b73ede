//! # ostinato
//!
//! Windowed metrics aggregation with double-buffered exposition serving.
//!
//! ostinato is a Rust library for sidecar-style metrics aggregation: callers
//! record individual measurement events, the pipeline accumulates them over
//! a sliding window of fixed generations, and a periodic rollup materializes
//! a text-exposition snapshot that scrape-based collectors can fetch — merged
//! with the process's own internal metrics.
//!
//! ## Key Properties
//!
//! - Ingestion never blocks on readers — a bounded single-consumer queue
//!   decouples producers from the store
//! - Readers never see a torn snapshot — a two-page serve ring hands off
//!   whole rendered pages, one short-lived read lock per request
//! - Bounded retention — a fixed generation count plus periodic rotation
//!   keeps memory flat regardless of event volume
//! - Deterministic output — a given set of measurements always renders to
//!   byte-identical exposition text
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ostinato::{Aggregator, AggregatorConfig, Measurement};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Start the pipeline; background workers handle rollup and rotation.
//! let aggregator = Aggregator::spawn(AggregatorConfig::new("svc_"))?;
//!
//! // Record measurements from anywhere in the process.
//! aggregator.record(
//!     Measurement::new("latency", 1.5).with_label("host", "web1"),
//! )?;
//!
//! // Serve this from your scrape endpoint.
//! let body = aggregator.expose();
//! # let _ = body;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Aggregator`] — top-level handle; owns the store, workers, and ring
//! - [`RollingStore`] — generational accumulation with newest-wins dedup
//! - [`ServeRing`] — double-buffered snapshot handoff to concurrent readers
//! - [`Telemetry`] — the pipeline's own instruments, merged into exposition
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`aggregator`] — pipeline lifecycle, rollup/rotation cadence
//! - [`measure`] — the measurement type and reserved label names
//! - [`store`] — the rolling generational store
//! - [`pipe`] — bounded ingestion queue and name transform
//! - [`ring`] — the serve-page ring
//! - [`expose`] — exposition text rendering
//! - [`telemetry`] — internal process metrics
//! - [`error`] — error types

pub mod aggregator;
pub mod error;
pub mod expose;
pub mod measure;
pub mod pipe;
pub mod ring;
pub mod store;
pub mod telemetry;

// Re-export primary API types at crate root for convenience.
pub use aggregator::{Aggregator, AggregatorConfig};
pub use error::{OstinatoError, Result};
pub use expose::render;
pub use measure::Measurement;
pub use pipe::IngestPipe;
pub use ring::ServeRing;
pub use store::RollingStore;
pub use telemetry::Telemetry;
