//! Thread-safe wrapper for concurrent index access.
//!
//! [`GeoSet`] is single-owner by design. `SyncGeoSet` wraps it in
//! `Arc<RwLock<GeoSet>>` so any number of concurrent readers can run
//! `position`/`distance`/`search` together while `upsert`/`remove` take
//! exclusive access. Each operation holds the lock for its full duration,
//! so a reader never observes a partially applied write.
//!
//! # Examples
//!
//! ```rust
//! use georadix::{SyncGeoSet, RadiusQuery, Unit};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let set = SyncGeoSet::new();
//!
//! let writer = set.clone();
//! let handle = thread::spawn(move || {
//!     writer.upsert("Palermo", 13.361389, 38.115556).unwrap();
//! });
//! handle.join().unwrap();
//!
//! let found = set.search(&RadiusQuery::around(13.361389, 38.115556, 1.0, Unit::Kilometers))?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::distance::Unit;
use crate::error::Result;
use crate::search::{RadiusQuery, SearchResult};
use crate::set::{GeoEntry, GeoSet};
use bytes::Bytes;
use geo::Point;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe handle to a shared [`GeoSet`].
#[derive(Clone, Default)]
pub struct SyncGeoSet {
    inner: Arc<RwLock<GeoSet>>,
}

impl SyncGeoSet {
    /// Create an empty shared index with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty shared index with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(GeoSet::with_config(config))),
        }
    }

    /// Wrap an existing index.
    pub fn from_set(set: GeoSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    /// Insert a member or update its position. See [`GeoSet::upsert`].
    pub fn upsert(&self, member: impl AsRef<[u8]>, lon: f64, lat: f64) -> Result<bool> {
        self.inner.write().upsert(member, lon, lat)
    }

    /// Insert or update a batch of members. See [`GeoSet::upsert_many`].
    pub fn upsert_many(&self, entries: &[GeoEntry]) -> Result<usize> {
        self.inner.write().upsert_many(entries)
    }

    /// Remove a member. Returns whether it existed.
    pub fn remove(&self, member: impl AsRef<[u8]>) -> bool {
        self.inner.write().remove(member)
    }

    /// Exact stored position of a member.
    pub fn position(&self, member: impl AsRef<[u8]>) -> Option<Point> {
        self.inner.read().position(member)
    }

    /// The member's 52-bit geocode, if present.
    pub fn geocode(&self, member: impl AsRef<[u8]>) -> Option<u64> {
        self.inner.read().geocode(member)
    }

    /// Great-circle distance between two members. See [`GeoSet::distance`].
    pub fn distance(
        &self,
        member_a: impl AsRef<[u8]>,
        member_b: impl AsRef<[u8]>,
        unit: Unit,
    ) -> Result<f64> {
        self.inner.read().distance(member_a, member_b, unit)
    }

    /// Run a radius query. See [`RadiusQuery`].
    pub fn search(&self, query: &RadiusQuery) -> Result<Vec<SearchResult>> {
        self.inner.read().search(query)
    }

    /// Member identifiers, collected under the read lock.
    pub fn members(&self) -> Vec<Bytes> {
        self.inner.read().members().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Remove every member.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Write a snapshot of the index to `path`.
    #[cfg(feature = "snapshot")]
    pub fn save_snapshot<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.inner.read().save_snapshot(path)
    }

    /// Load a shared index from a snapshot file.
    #[cfg(feature = "snapshot")]
    pub fn load_snapshot<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::from_set(GeoSet::load_snapshot(path)?))
    }
}
