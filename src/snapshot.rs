//! Snapshot persistence for [`GeoSet`].
//!
//! Only the reverse mapping (member, longitude, latitude) is persisted; the
//! ordered geocode index is rebuilt deterministically through the codec on
//! load and is never treated as a source of truth. Snapshots are written to
//! a temporary file and renamed into place, so a crash mid-write leaves the
//! previous snapshot intact.

use crate::config::Config;
use crate::error::{GeoError, Result};
use crate::set::GeoSet;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const SNAPSHOT_MAGIC: &[u8] = b"GEORADIX_SNAP";
const SNAPSHOT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    member: Bytes,
    lon: f64,
    lat: f64,
}

impl GeoSet {
    /// Write a snapshot of the index to `path`, atomically replacing any
    /// previous snapshot there.
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");

        let entries: Vec<SnapshotEntry> = self
            .store
            .iter()
            .map(|(member, point)| SnapshotEntry {
                member: member.clone(),
                lon: point.x(),
                lat: point.y(),
            })
            .collect();

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(SNAPSHOT_MAGIC)?;
            writer.write_all(&[SNAPSHOT_VERSION])?;
            bincode::serialize_into(&mut writer, &entries)
                .map_err(|e| GeoError::Serialization(e.to_string()))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        std::fs::rename(&tmp_path, path)?;
        log::debug!("snapshot of {} members written to {}", entries.len(), path.display());
        Ok(())
    }

    /// Load an index from a snapshot file, with default configuration.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_snapshot_with_config(path, Config::default())
    }

    /// Load an index from a snapshot file.
    ///
    /// Fails with [`GeoError::InvalidFormat`] if the file does not carry
    /// the expected header, and with [`GeoError::OutOfRange`] if an entry
    /// holds coordinates the codec rejects.
    pub fn load_snapshot_with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; SNAPSHOT_MAGIC.len()];
        reader.read_exact(&mut magic)?;
        if magic != SNAPSHOT_MAGIC {
            return Err(GeoError::InvalidFormat);
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != SNAPSHOT_VERSION {
            return Err(GeoError::InvalidFormat);
        }

        let entries: Vec<SnapshotEntry> = bincode::deserialize_from(&mut reader)
            .map_err(|e| GeoError::Serialization(e.to_string()))?;

        let mut set = GeoSet::with_config(config);
        for entry in &entries {
            set.upsert(&entry.member, entry.lon, entry.lat)?;
        }

        log::info!(
            "restored {} members from snapshot {}",
            set.len(),
            path.as_ref().display()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RadiusQuery, Unit};
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sicily.snap");

        let mut set = GeoSet::new();
        set.upsert("Palermo", 13.361389, 38.115556).unwrap();
        set.upsert("Catania", 15.087269, 37.502669).unwrap();
        set.save_snapshot(&path).unwrap();

        let restored = GeoSet::load_snapshot(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.position("Palermo"), set.position("Palermo"));
        assert_eq!(restored.geocode("Catania"), set.geocode("Catania"));

        // The rebuilt ordered index answers queries identically.
        let query = RadiusQuery::around(13.361389, 38.115556, 200.0, Unit::Kilometers)
            .order(crate::SortOrder::Ascending)
            .with_distance();
        assert_eq!(set.search(&query).unwrap(), restored.search(&query).unwrap());
    }

    #[test]
    fn test_snapshot_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.snap");

        let mut set = GeoSet::new();
        set.upsert("a", 1.0, 1.0).unwrap();
        set.save_snapshot(&path).unwrap();

        set.upsert("b", 2.0, 2.0).unwrap();
        set.save_snapshot(&path).unwrap();

        let restored = GeoSet::load_snapshot(&path).unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_snapshot_rejects_bad_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.snap");
        std::fs::write(&path, b"not a snapshot at all").unwrap();

        let err = GeoSet::load_snapshot(&path).unwrap_err();
        assert!(matches!(err, GeoError::InvalidFormat));
    }

    #[test]
    fn test_snapshot_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = GeoSet::load_snapshot(dir.path().join("absent.snap")).unwrap_err();
        assert!(matches!(err, GeoError::Io(_)));
    }

    #[test]
    fn test_empty_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.snap");

        GeoSet::new().save_snapshot(&path).unwrap();
        let restored = GeoSet::load_snapshot(&path).unwrap();
        assert!(restored.is_empty());
    }
}
