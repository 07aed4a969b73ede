//! Double-buffered serve ring for published snapshots.
//!
//! # Design
//!
//! A fixed set of pages (two by default) plus an atomic index naming the
//! page currently being served. The writer renders into the page *after*
//! the current one, then advances the index; readers always take the
//! current page under that page's own shared lock. Writer and readers
//! therefore never contend on the same page: readers in flight against the
//! old page finish undisturbed, new readers immediately see the new
//! snapshot, and exactly one committed stale page stays resident.
//!
//! The index only ever moves forward around the ring, so snapshot recency
//! is monotonically non-decreasing for any reader.
//!
//! # Thread Safety
//!
//! `publish` is intended for a single writer (the rollup scheduler, under
//! the process-wide store lock). `read` is safe from any number of threads
//! concurrently with a publish.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of serve pages in the ring by default. Two is enough: one being
/// served, one being written.
pub const DEFAULT_PAGE_COUNT: usize = 2;

/// Fixed-size ring of snapshot pages with an atomic current-page index.
///
/// Pages are created once at construction and mutated in place for the
/// life of the ring.
#[derive(Debug)]
pub struct ServeRing {
    /// Snapshot payloads, one lock per page.
    pages: Vec<RwLock<String>>,
    /// Index of the page currently served to readers.
    current: AtomicUsize,
}

impl ServeRing {
    /// Creates a ring of `page_count` empty pages (minimum 1).
    pub fn new(page_count: usize) -> Self {
        let count = page_count.max(1);
        let pages = (0..count).map(|_| RwLock::new(String::new())).collect();
        Self {
            pages,
            current: AtomicUsize::new(0),
        }
    }

    /// Returns the number of pages in the ring.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the current page's payload under its shared lock.
    ///
    /// Empty until the first publish.
    pub fn read(&self) -> String {
        let index = self.current.load(Ordering::Acquire);
        self.pages[index]
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Writes a freshly rendered snapshot into the next page, then advances
    /// the current-page index to it.
    pub fn publish(&self, snapshot: String) {
        let next = (self.current.load(Ordering::Acquire) + 1) % self.pages.len();
        {
            let mut page = self.pages[next]
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *page = snapshot;
        }
        self.current.store(next, Ordering::Release);
    }
}

impl Default for ServeRing {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_COUNT)
    }
}
