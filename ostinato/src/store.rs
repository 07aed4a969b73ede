//! Rolling generational store for accumulated measurements.
//!
//! # Design
//!
//! The store holds a small fixed number of *generations* — time-bounded
//! buckets of measurements keyed by identity. Inserts land in the current
//! (newest) generation; rotation discards the oldest generation and opens a
//! fresh current one. A measurement inserted at time T stays visible to
//! `dump` until at most (generation count − 1) rotations after T, then it is
//! permanently gone. That bounded retention is the point of the design, not
//! a leak to be fixed.
//!
//! The store has no internal locking. Its single owner wraps it in the
//! process-wide mutex; insert, dump and roll all run under that one lock.

use std::collections::{HashMap, VecDeque};

use crate::error::{OstinatoError, Result};
use crate::measure::{HASH_LABEL, Measurement};

/// Number of generations retained by default.
pub const DEFAULT_GENERATIONS: usize = 2;

/// Generational measurement store with newest-wins deduplication.
///
/// Generations are ordered newest-first; rotation pops the oldest and
/// pushes an empty current generation, so the configured count is invariant
/// for the life of the store.
#[derive(Debug)]
pub struct RollingStore {
    /// Live generations, newest first. Never empty.
    generations: VecDeque<HashMap<String, Measurement>>,
}

impl RollingStore {
    /// Creates a store retaining `generation_count` generations (minimum 1).
    pub fn new(generation_count: usize) -> Self {
        let count = generation_count.max(1);
        let mut generations = VecDeque::with_capacity(count);
        for _ in 0..count {
            generations.push_back(HashMap::new());
        }
        Self { generations }
    }

    /// Places a measurement into the current generation.
    ///
    /// The measurement's identity is stamped into its [`HASH_LABEL`] entry.
    /// An existing measurement with the same identity in the current
    /// generation is displaced.
    pub fn insert(&mut self, mut measurement: Measurement) {
        let identity = measurement.identity();
        measurement
            .labels
            .insert(HASH_LABEL.to_string(), identity.clone());
        if let Some(current) = self.generations.front_mut() {
            current.insert(identity, measurement);
        }
    }

    /// Returns a flat, deduplicated view across all live generations.
    ///
    /// When an identity appears in several generations, the newest copy
    /// wins. Output order is unspecified; rendering sorts.
    pub fn dump(&self) -> Vec<Measurement> {
        let mut merged: HashMap<&str, &Measurement> = HashMap::new();
        // Oldest first, so newer generations overwrite on collision.
        for generation in self.generations.iter().rev() {
            for (identity, measurement) in generation {
                merged.insert(identity.as_str(), measurement);
            }
        }
        merged.into_values().cloned().collect()
    }

    /// Discards the oldest generation and opens a new current one.
    pub fn roll(&mut self) {
        self.generations.pop_back();
        self.generations.push_front(HashMap::new());
    }

    /// Looks up a measurement by identity, newest generation first.
    ///
    /// # Errors
    ///
    /// Returns [`OstinatoError::NotFound`] when no live generation holds
    /// the identity.
    pub fn get(&self, identity: &str) -> Result<&Measurement> {
        self.generations
            .iter()
            .find_map(|generation| generation.get(identity))
            .ok_or_else(|| OstinatoError::NotFound {
                identity: identity.to_string(),
            })
    }

    /// Returns the number of distinct identities across live generations.
    pub fn len(&self) -> usize {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for generation in &self.generations {
            for identity in generation.keys() {
                seen.insert(identity.as_str());
            }
        }
        seen.len()
    }

    /// Returns true when no generation holds any measurement.
    pub fn is_empty(&self) -> bool {
        self.generations.iter().all(HashMap::is_empty)
    }

    /// Returns the configured generation count.
    pub fn generation_count(&self) -> usize {
        self.generations.len()
    }
}

impl Default for RollingStore {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATIONS)
    }
}
