//! Embedded geospatial index with radius queries over a sortable geocode
//! key space.
//!
//! Members are opaque identifiers pinned to (longitude, latitude) positions.
//! Each position is quantized into a 52-bit interleaved geocode, and radius
//! queries scan a handful of geocode ranges instead of the whole index,
//! filtering candidates by exact great-circle distance.
//!
//! ```rust
//! use georadix::{GeoSet, RadiusQuery, SortOrder, Unit};
//!
//! let mut set = GeoSet::new();
//! set.upsert("Palermo", 13.361389, 38.115556)?;
//! set.upsert("Catania", 15.087269, 37.502669)?;
//!
//! let km = set.distance("Palermo", "Catania", Unit::Kilometers)?;
//! assert!((km - 166.27).abs() < 0.01);
//!
//! let nearby = set.search(
//!     &RadiusQuery::around(15.0, 37.0, 200.0, Unit::Kilometers)
//!         .order(SortOrder::Ascending)
//!         .with_distance(),
//! )?;
//! assert_eq!(nearby.len(), 2);
//! # Ok::<(), georadix::GeoError>(())
//! ```

pub mod codec;
pub mod config;
pub mod distance;
pub mod error;
pub mod search;
pub mod set;
pub mod store;

#[cfg(feature = "snapshot")]
pub mod snapshot;

#[cfg(feature = "sync")]
pub mod sync;

pub use config::Config;
pub use distance::{EARTH_RADIUS_METERS, Unit, haversine};
pub use error::{GeoError, Result};
pub use search::{RadiusQuery, SearchResult, SortOrder};
pub use set::{GeoEntry, GeoSet};

#[cfg(feature = "sync")]
pub use sync::SyncGeoSet;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Config, GeoEntry, GeoError, GeoSet, Result};

    pub use crate::{RadiusQuery, SearchResult, SortOrder, Unit};

    pub use geo::Point;

    #[cfg(feature = "sync")]
    pub use crate::SyncGeoSet;
}
