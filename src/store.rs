//! Ordered spatial store backing the index.
//!
//! Two structures are kept in lockstep: a `BTreeMap` from 52-bit score to
//! the set of members in that cell (ordered, so range scans cost time
//! proportional to the range, not the index), and a hash map from member to
//! its exact position and current score. Every mutation updates both maps
//! before returning, so callers never observe them out of step.

use bytes::Bytes;
use geo::Point;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Position and score currently recorded for a member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberEntry {
    pub point: Point,
    pub score: u64,
}

/// Ordered score index plus reverse member lookup.
#[derive(Debug, Default)]
pub struct SpatialStore {
    cells: BTreeMap<u64, BTreeSet<Bytes>>,
    members: FxHashMap<Bytes, MemberEntry>,
}

impl SpatialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member or move it to a new position.
    ///
    /// Returns `true` when the member was newly added, `false` when an
    /// existing member was updated in place.
    pub fn upsert(&mut self, member: Bytes, point: Point, score: u64) -> bool {
        if let Some(entry) = self.members.get_mut(&member) {
            if entry.score != score {
                let old_score = entry.score;
                entry.point = point;
                entry.score = score;
                Self::remove_from_cell(&mut self.cells, old_score, &member);
                self.cells.entry(score).or_default().insert(member);
            } else {
                entry.point = point;
            }
            return false;
        }

        self.cells.entry(score).or_default().insert(member.clone());
        self.members.insert(member, MemberEntry { point, score });
        true
    }

    /// Exact stored position of a member, if present.
    pub fn position(&self, member: &[u8]) -> Option<Point> {
        self.members.get(member).map(|entry| entry.point)
    }

    /// Current 52-bit score of a member, if present.
    pub fn score(&self, member: &[u8]) -> Option<u64> {
        self.members.get(member).map(|entry| entry.score)
    }

    /// Full entry for a member, if present.
    pub fn entry(&self, member: &[u8]) -> Option<&MemberEntry> {
        self.members.get(member)
    }

    /// Remove a member from both maps. Returns whether it existed.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        let Some(entry) = self.members.remove(member) else {
            return false;
        };
        Self::remove_from_cell(&mut self.cells, entry.score, member);
        true
    }

    /// Inclusive ordered scan over `[low, high]` in score space.
    pub fn range_scan(&self, low: u64, high: u64) -> impl Iterator<Item = (u64, &Bytes)> {
        self.cells
            .range(low..=high)
            .flat_map(|(&score, members)| members.iter().map(move |m| (score, m)))
    }

    /// Iterate over every member and its exact position.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, Point)> {
        self.members.iter().map(|(member, entry)| (member, entry.point))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.members.clear();
    }

    fn remove_from_cell(cells: &mut BTreeMap<u64, BTreeSet<Bytes>>, score: u64, member: &[u8]) {
        if let Some(bucket) = cells.get_mut(&score) {
            bucket.remove(member);
            if bucket.is_empty() {
                cells.remove(&score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> Bytes {
        Bytes::copy_from_slice(name.as_bytes())
    }

    #[test]
    fn test_upsert_reports_new_vs_updated() {
        let mut store = SpatialStore::new();
        let p = Point::new(13.36, 38.11);

        assert!(store.upsert(member("a"), p, 100));
        assert!(!store.upsert(member("a"), p, 100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_moves_cell_entry() {
        let mut store = SpatialStore::new();
        let p1 = Point::new(13.36, 38.11);
        let p2 = Point::new(15.08, 37.50);

        store.upsert(member("a"), p1, 100);
        store.upsert(member("a"), p2, 200);

        assert_eq!(store.position(b"a"), Some(p2));
        assert_eq!(store.score(b"a"), Some(200));

        let at_old: Vec<_> = store.range_scan(100, 100).collect();
        assert!(at_old.is_empty());
        let at_new: Vec<_> = store.range_scan(200, 200).collect();
        assert_eq!(at_new.len(), 1);
    }

    #[test]
    fn test_position_absent_member() {
        let store = SpatialStore::new();
        assert!(store.position(b"ghost").is_none());
        assert!(store.score(b"ghost").is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = SpatialStore::new();
        store.upsert(member("a"), Point::new(1.0, 2.0), 42);

        assert!(store.remove(b"a"));
        assert!(!store.remove(b"a"));
        assert!(store.is_empty());
        assert_eq!(store.range_scan(0, u64::MAX).count(), 0);
    }

    #[test]
    fn test_range_scan_is_inclusive_and_ordered() {
        let mut store = SpatialStore::new();
        let p = Point::new(0.0, 0.0);
        store.upsert(member("low"), p, 10);
        store.upsert(member("mid"), p, 20);
        store.upsert(member("high"), p, 30);
        store.upsert(member("out"), p, 31);

        let scanned: Vec<u64> = store.range_scan(10, 30).map(|(s, _)| s).collect();
        assert_eq!(scanned, vec![10, 20, 30]);
    }

    #[test]
    fn test_members_sharing_a_cell() {
        let mut store = SpatialStore::new();
        let p = Point::new(0.0, 0.0);
        store.upsert(member("a"), p, 7);
        store.upsert(member("b"), p, 7);

        let in_cell: Vec<_> = store.range_scan(7, 7).map(|(_, m)| m.clone()).collect();
        assert_eq!(in_cell.len(), 2);

        assert!(store.remove(b"a"));
        assert_eq!(store.range_scan(7, 7).count(), 1);
        assert_eq!(store.position(b"b"), Some(p));
    }

    #[test]
    fn test_clear() {
        let mut store = SpatialStore::new();
        store.upsert(member("a"), Point::new(1.0, 1.0), 1);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.range_scan(0, u64::MAX).count(), 0);
    }
}
