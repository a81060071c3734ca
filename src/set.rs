//! The public geospatial index type.

use crate::codec;
use crate::config::Config;
use crate::distance::{Unit, haversine};
use crate::error::{GeoError, Result};
use crate::search::{RadiusQuery, SearchResult};
use crate::store::SpatialStore;
use bytes::Bytes;
use geo::Point;

/// A member identifier paired with its position, for batch inserts.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoEntry {
    pub point: Point,
    pub member: Bytes,
}

impl GeoEntry {
    pub fn new(lon: f64, lat: f64, member: impl AsRef<[u8]>) -> Self {
        Self {
            point: Point::new(lon, lat),
            member: Bytes::copy_from_slice(member.as_ref()),
        }
    }
}

/// An in-memory geospatial index: named members at (longitude, latitude)
/// positions with distance and radius queries.
///
/// A `GeoSet` has a single logical owner: writes take `&mut self`, reads
/// take `&self`, and there is no interior locking. For shared concurrent
/// access wrap it in [`SyncGeoSet`](crate::SyncGeoSet) (feature `sync`).
///
/// # Examples
///
/// ```rust
/// use georadix::{GeoSet, RadiusQuery, Unit};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut set = GeoSet::new();
/// set.upsert("Palermo", 13.361389, 38.115556)?;
/// set.upsert("Catania", 15.087269, 37.502669)?;
///
/// let meters = set.distance("Palermo", "Catania", Unit::Meters)?;
/// assert!((meters - 166_274.0).abs() < 2.0);
///
/// let nearby = set.search(&RadiusQuery::around(13.361389, 38.115556, 100.0, Unit::Meters))?;
/// assert_eq!(nearby.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct GeoSet {
    pub(crate) store: SpatialStore,
    pub(crate) config: Config,
}

impl GeoSet {
    /// Create an empty index with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            store: SpatialStore::new(),
            config,
        }
    }

    /// Insert a member or update its position.
    ///
    /// Returns `true` when the member was newly added, `false` when an
    /// existing member was moved or re-added. Fails with
    /// [`GeoError::OutOfRange`] for coordinates outside the indexable box,
    /// leaving the index untouched.
    pub fn upsert(&mut self, member: impl AsRef<[u8]>, lon: f64, lat: f64) -> Result<bool> {
        let score = codec::encode_score(lon, lat)?;
        Ok(self.store.upsert(
            Bytes::copy_from_slice(member.as_ref()),
            Point::new(lon, lat),
            score,
        ))
    }

    /// Insert or update a batch of members.
    ///
    /// Returns the number of members that were newly added; re-adding an
    /// existing member updates it without counting. Every entry is
    /// validated before the first mutation, so a bad coordinate anywhere in
    /// the batch leaves the index untouched.
    pub fn upsert_many(&mut self, entries: &[GeoEntry]) -> Result<usize> {
        let mut scores = Vec::with_capacity(entries.len());
        for entry in entries {
            scores.push(codec::encode_score(entry.point.x(), entry.point.y())?);
        }

        let mut added = 0;
        for (entry, score) in entries.iter().zip(scores) {
            if self.store.upsert(entry.member.clone(), entry.point, score) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Remove a member. Returns whether it existed.
    pub fn remove(&mut self, member: impl AsRef<[u8]>) -> bool {
        self.store.remove(member.as_ref())
    }

    /// Exact stored position of a member.
    pub fn position(&self, member: impl AsRef<[u8]>) -> Option<Point> {
        self.store.position(member.as_ref())
    }

    /// The member's 52-bit geocode, if present.
    pub fn geocode(&self, member: impl AsRef<[u8]>) -> Option<u64> {
        self.store.score(member.as_ref())
    }

    /// Great-circle distance between two members, in the requested unit.
    ///
    /// Fails with [`GeoError::MemberNotFound`] naming whichever member is
    /// absent.
    pub fn distance(
        &self,
        member_a: impl AsRef<[u8]>,
        member_b: impl AsRef<[u8]>,
        unit: Unit,
    ) -> Result<f64> {
        let a = self
            .store
            .position(member_a.as_ref())
            .ok_or_else(|| GeoError::member_not_found(member_a.as_ref()))?;
        let b = self
            .store
            .position(member_b.as_ref())
            .ok_or_else(|| GeoError::member_not_found(member_b.as_ref()))?;

        Ok(unit.from_meters(haversine(&a, &b)))
    }

    /// Run a radius query. See [`RadiusQuery`] for options.
    pub fn search(&self, query: &RadiusQuery) -> Result<Vec<SearchResult>> {
        query.run(&self.store, &self.config)
    }

    /// Iterate over all member identifiers, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &Bytes> {
        self.store.iter().map(|(member, _)| member)
    }

    /// Number of members in the index.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
