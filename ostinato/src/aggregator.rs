//! Aggregator lifecycle: ingestion, rollup scheduling, and exposition.
//!
//! # Design
//!
//! One [`Aggregator`] per prefix, built by the caller's bootstrap and
//! shared by reference. It owns the rolling store behind a single internal
//! mutex, the serve ring, the telemetry registry, and two background
//! workers:
//!
//! - the ingest consumer — sole writer into the store (see [`crate::pipe`]);
//! - the scheduler — every tick it rolls the store's contents up into a
//!   published snapshot, and every `rotate_every`th tick it additionally
//!   rotates the store's generations.
//!
//! Rollup and rotation are separate acquisitions of the same store lock,
//! so a rollup's dump never interleaves with a rotation, and neither races
//! the consumer's inserts. The serve-ring handoff keeps readers off that
//! lock entirely.
//!
//! `rollup` and `rotate` are public so an embedding event loop (or a test)
//! can drive the cadence itself instead of relying on wall-clock ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{OstinatoError, Result};
use crate::expose;
use crate::measure::Measurement;
use crate::pipe::{self, IngestPipe};
use crate::ring::ServeRing;
use crate::store::RollingStore;
use crate::telemetry::{ERROR_KIND_NAN, Telemetry};

/// Default time between rollup ticks.
pub const ROLLUP_PERIOD: Duration = Duration::from_secs(10);

/// Default number of rollup ticks between store rotations. With the 10 s
/// rollup period this gives a 60 s rotation cadence.
pub const ROTATE_EVERY: u32 = 6;

/// Aggregator construction parameters.
///
/// The defaults reproduce the reference cadence: 10 s rollups, rotation
/// every 6th tick, 2 retained generations — a sliding retention window of
/// roughly two minutes.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Prefix prepended to every ingested series name.
    pub prefix: String,
    /// Time between rollup ticks.
    pub rollup_period: Duration,
    /// Rollup ticks between store rotations (minimum 1).
    pub rotate_every: u32,
    /// Retained store generations (minimum 1).
    pub generations: usize,
}

impl AggregatorConfig {
    /// Creates a config with the given prefix and default cadence.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            rollup_period: ROLLUP_PERIOD,
            rotate_every: ROTATE_EVERY,
            generations: crate::store::DEFAULT_GENERATIONS,
        }
    }
}

/// The aggregation pipeline: store, ingest pipe, serve ring, telemetry,
/// and the two background workers.
///
/// Dropping the aggregator shuts it down; [`Aggregator::shutdown`] does the
/// same explicitly and is idempotent.
pub struct Aggregator {
    store: Arc<Mutex<RollingStore>>,
    ring: Arc<ServeRing>,
    telemetry: Arc<Telemetry>,
    /// Taken (and thereby closed) on shutdown.
    pipe: Mutex<Option<IngestPipe>>,
    /// Wakes the scheduler out of its tick wait on shutdown.
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
    stop: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Aggregator {
    /// Builds the pipeline and starts the ingest consumer and the rollup
    /// scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`OstinatoError::Telemetry`] if instrument registration
    /// fails; there is no other construction failure path.
    pub fn spawn(config: AggregatorConfig) -> Result<Self> {
        let telemetry = Arc::new(Telemetry::new()?);
        let store = Arc::new(Mutex::new(RollingStore::new(config.generations)));
        let ring = Arc::new(ServeRing::default());
        let stop = Arc::new(AtomicBool::new(false));

        let (ingest, rx) = IngestPipe::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        let consumer = {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            let prefix = config.prefix.clone();
            std::thread::spawn(move || pipe::run(&rx, &store, &prefix, &stop))
        };

        let scheduler = {
            let store = Arc::clone(&store);
            let ring = Arc::clone(&ring);
            let telemetry = Arc::clone(&telemetry);
            let period = config.rollup_period;
            let rotate_every = config.rotate_every.max(1);
            std::thread::spawn(move || {
                let mut tick = 0u32;
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            tick = (tick + 1) % rotate_every;
                            rollup_pass(&store, &ring, &telemetry);
                            if tick == 0 {
                                rotate_pass(&store);
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("rollup scheduler stopped");
            })
        };

        tracing::info!(
            prefix = %config.prefix,
            period_secs = config.rollup_period.as_secs_f64(),
            rotate_every = config.rotate_every.max(1),
            generations = config.generations.max(1),
            "aggregator started"
        );

        Ok(Self {
            store,
            ring,
            telemetry,
            pipe: Mutex::new(Some(ingest)),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop,
            workers: Mutex::new(vec![consumer, scheduler]),
        })
    }

    /// Enqueues a measurement for asynchronous ingestion.
    ///
    /// Blocks only on queue backpressure (depth 1); never on readers or
    /// the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`OstinatoError::PipeClosed`] after `shutdown`.
    pub fn record(&self, measurement: Measurement) -> Result<()> {
        // Clone the sender out of the lock so a blocked send never holds it.
        let ingest = self
            .pipe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match ingest {
            Some(pipe) => pipe.record(measurement),
            None => Err(OstinatoError::PipeClosed),
        }
    }

    /// Runs one rollup: dump the store, drop NaN observations, render, and
    /// publish to the serve ring.
    pub fn rollup(&self) {
        rollup_pass(&self.store, &self.ring, &self.telemetry);
    }

    /// Rotates the store: the oldest generation is discarded.
    pub fn rotate(&self) {
        rotate_pass(&self.store);
    }

    /// Returns a point-in-time view of the accumulated measurements.
    pub fn dump(&self) -> Vec<Measurement> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dump()
    }

    /// Looks up an accumulated measurement by identity.
    ///
    /// # Errors
    ///
    /// Returns [`OstinatoError::NotFound`] when no live generation holds
    /// the identity.
    pub fn get(&self, identity: &str) -> Result<Measurement> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Builds the full exposition response: internal process metrics
    /// followed by the current served snapshot.
    pub fn expose(&self) -> String {
        let mut out = String::new();
        self.telemetry.encode_into(&mut out);
        out.push_str(&self.ring.read());

        self.telemetry.requests.inc();
        #[allow(clippy::cast_precision_loss)] // response sizes are nowhere near 2^52
        self.telemetry.return_size.observe(out.len() as f64);
        out
    }

    /// Stops both workers and closes the ingest pipe. Idempotent; records
    /// issued after this return [`OstinatoError::PipeClosed`].
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Relaxed);
        // Dropping the sender ends the consumer once the queue drains.
        self.pipe.lock().unwrap_or_else(PoisonError::into_inner).take();
        // Dropping the stop sender wakes the scheduler immediately.
        self.stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One rollup pass, under the store lock from dump through publish.
fn rollup_pass(store: &Mutex<RollingStore>, ring: &ServeRing, telemetry: &Telemetry) {
    let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
    let dumped = guard.dump();

    let mut kept = Vec::with_capacity(dumped.len());
    let mut skipped = 0u64;
    for measurement in dumped {
        if measurement.value.is_nan() {
            skipped += 1;
        } else {
            kept.push(measurement);
        }
    }
    if skipped > 0 {
        telemetry
            .errors
            .with_label_values(&[ERROR_KIND_NAN])
            .inc_by(skipped);
    }
    #[allow(clippy::cast_precision_loss)] // series counts are nowhere near 2^52
    telemetry.snapshot_series.observe(kept.len() as f64);

    ring.publish(expose::render(&kept));
    drop(guard);
}

/// One rotation pass, a separate acquisition of the same store lock.
fn rotate_pass(store: &Mutex<RollingStore>) {
    store
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .roll();
}
