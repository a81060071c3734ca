//! Great-circle distance math and distance units.
//!
//! All internal computation is in meters; [`Unit`] scales values at the API
//! boundary only.

use crate::error::{GeoError, Result};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Earth radius in meters used for haversine distances.
///
/// This is the same constant the widely deployed geo index implementations
/// use, so distances computed here can be cross-checked against them.
pub const EARTH_RADIUS_METERS: f64 = 6_372_797.560856;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.34;
const METERS_PER_FOOT: f64 = 0.3048;

/// Distance unit accepted for input radii and reported distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl Unit {
    /// Meters per one of this unit.
    fn ratio(self) -> f64 {
        match self {
            Unit::Meters => 1.0,
            Unit::Kilometers => METERS_PER_KILOMETER,
            Unit::Miles => METERS_PER_MILE,
            Unit::Feet => METERS_PER_FOOT,
        }
    }

    /// Convert a value expressed in this unit to meters.
    pub fn to_meters(self, value: f64) -> f64 {
        value * self.ratio()
    }

    /// Convert a value in meters to this unit.
    pub fn from_meters(self, meters: f64) -> f64 {
        meters / self.ratio()
    }

    /// Short name, as accepted by [`Unit::from_str`].
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Meters => "m",
            Unit::Kilometers => "km",
            Unit::Miles => "mi",
            Unit::Feet => "ft",
        }
    }
}

impl FromStr for Unit {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "m" | "meter" | "meters" => Ok(Unit::Meters),
            "km" | "kilometer" | "kilometers" => Ok(Unit::Kilometers),
            "mi" | "mile" | "miles" => Ok(Unit::Miles),
            "ft" | "foot" | "feet" => Ok(Unit::Feet),
            other => Err(GeoError::InvalidParameter(format!(
                "unrecognized distance unit: {:?}",
                other
            ))),
        }
    }
}

/// Great-circle distance between two points in meters.
///
/// Standard haversine formula over a spherical Earth. Deterministic and
/// symmetric in its arguments.
///
/// # Examples
///
/// ```rust
/// use geo::Point;
/// use georadix::distance::haversine;
///
/// let palermo = Point::new(13.361389, 38.115556);
/// let catania = Point::new(15.087269, 37.502669);
///
/// let meters = haversine(&palermo, &catania);
/// assert!((meters - 166_274.15).abs() < 1.0);
/// ```
#[inline]
pub fn haversine(a: &Point, b: &Point) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}
