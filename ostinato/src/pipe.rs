//! Bounded ingestion pipe between producers and the store.
//!
//! # Design
//!
//! Producers hand measurements to [`IngestPipe::record`]; a single
//! background consumer drains them in FIFO order, applies the name
//! transform, and inserts into the store. The queue depth is 1: the first
//! un-drained send buffers, a second concurrent send blocks until the
//! consumer catches up. That blocking is the backpressure policy — events
//! are never dropped silently and saturation never raises a fault.
//!
//! The consumer is the only writer into the store, so ordering across
//! producers is exactly queue arrival order.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel};
use std::time::Duration;

use crate::error::{OstinatoError, Result};
use crate::measure::{DEFAULT_NAME, Measurement};
use crate::store::RollingStore;

/// Queue capacity between producers and the consumer.
pub const QUEUE_DEPTH: usize = 1;

/// How often the consumer checks the stop flag while idle.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Sending half of the ingestion queue.
///
/// Cheap to clone; every clone feeds the same single consumer.
#[derive(Debug, Clone)]
pub struct IngestPipe {
    tx: SyncSender<Measurement>,
}

impl IngestPipe {
    /// Creates the bounded queue, returning the pipe and the consumer's
    /// receiving half.
    pub fn channel() -> (Self, Receiver<Measurement>) {
        let (tx, rx) = sync_channel(QUEUE_DEPTH);
        (Self { tx }, rx)
    }

    /// Enqueues a measurement for asynchronous processing.
    ///
    /// Blocks while the queue is saturated (see module docs).
    ///
    /// # Errors
    ///
    /// Returns [`OstinatoError::PipeClosed`] once the consumer has gone
    /// away, which only happens after shutdown.
    pub fn record(&self, measurement: Measurement) -> Result<()> {
        self.tx
            .send(measurement)
            .map_err(|_| OstinatoError::PipeClosed)
    }
}

/// Applies the series-name transform: fall back to [`DEFAULT_NAME`] when
/// the declared name is absent or empty, then prepend `prefix` and write
/// the result back into the label set.
pub fn transform(mut measurement: Measurement, prefix: &str) -> Measurement {
    let name = format!("{prefix}{}", measurement.name().unwrap_or(DEFAULT_NAME));
    measurement.set_name(name);
    measurement
}

/// Consumer loop: drain the queue into the store until every sender is
/// dropped or the stop flag is raised while idle.
pub(crate) fn run(
    rx: &Receiver<Measurement>,
    store: &Mutex<RollingStore>,
    prefix: &str,
    stop: &AtomicBool,
) {
    loop {
        match rx.recv_timeout(STOP_POLL) {
            Ok(measurement) => {
                let measurement = transform(measurement, prefix);
                store
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(measurement);
            }
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("ingest consumer stopped");
}
