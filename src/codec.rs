//! Coordinate codec: quantized (longitude, latitude) cells and their
//! interleaved integer geocodes.
//!
//! A cell at step `s` quantizes each axis into `s` bits over the fixed
//! bounding box and interleaves them (latitude in even bits, longitude in
//! odd bits) into a `2*s`-bit value. At the maximum step of 26 the result
//! is the 52-bit score the store orders members by. Nearby cells produce
//! numerically close geocodes, which is what makes range scans over the
//! score space useful for spatial queries.

use crate::error::{GeoError, Result};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Southernmost indexable latitude (Mercator-safe band).
pub const LAT_MIN: f64 = -85.05112878;
/// Northernmost indexable latitude.
pub const LAT_MAX: f64 = 85.05112878;
/// Westernmost indexable longitude.
pub const LON_MIN: f64 = -180.0;
/// Easternmost indexable longitude.
pub const LON_MAX: f64 = 180.0;

/// Finest quantization step; yields the 52-bit score geocode.
pub const MAX_STEP: u8 = 26;

/// Half the Earth's equatorial circumference in the Mercator projection,
/// used to derive a quantization step from a search radius.
const MERCATOR_MAX: f64 = 20_037_726.37;

const EVEN_BITS: u64 = 0x5555_5555_5555_5555;
const ODD_BITS: u64 = 0xAAAA_AAAA_AAAA_AAAA;

/// A quantized cell: `2 * step` interleaved bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub bits: u64,
    pub step: u8,
}

/// Geographic rectangle covered by a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// Inclusive range of 52-bit scores covered by a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: u64,
    pub max: u64,
}

/// The 3x3 block of a cell and its eight adjacent cells.
///
/// Longitude neighbors wrap across the antimeridian. Latitude moves past
/// the top or bottom row wrap within the bit space and may land far away;
/// callers that scan neighbor cells must filter candidates by exact
/// distance, so the stray cells only cost scan time, never correctness.
#[derive(Debug, Clone, Copy)]
pub struct Neighbors {
    pub center: Cell,
    pub north: Cell,
    pub north_east: Cell,
    pub east: Cell,
    pub south_east: Cell,
    pub south: Cell,
    pub south_west: Cell,
    pub west: Cell,
    pub north_west: Cell,
}

impl Neighbors {
    /// All nine cells, center first.
    pub fn cells(&self) -> [Cell; 9] {
        [
            self.center,
            self.north,
            self.north_east,
            self.east,
            self.south_east,
            self.south,
            self.south_west,
            self.west,
            self.north_west,
        ]
    }
}

/// Validates that a coordinate pair is finite and inside the indexable box.
pub fn validate(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite()
        || !lat.is_finite()
        || !(LON_MIN..=LON_MAX).contains(&lon)
        || !(LAT_MIN..=LAT_MAX).contains(&lat)
    {
        return Err(GeoError::OutOfRange { lon, lat });
    }
    Ok(())
}

/// Encodes a coordinate pair into the cell containing it at `step`.
///
/// Fails with [`GeoError::OutOfRange`] outside the bounding box. A
/// coordinate exactly on the upper bound of an axis falls into the last
/// cell, so the geocode never exceeds `2 * step` bits.
pub fn encode(lon: f64, lat: f64, step: u8) -> Result<Cell> {
    debug_assert!((1..=MAX_STEP).contains(&step));
    validate(lon, lat)?;

    let scale = (1u64 << step) as f64;
    let lat_off = (lat - LAT_MIN) / (LAT_MAX - LAT_MIN);
    let lon_off = (lon - LON_MIN) / (LON_MAX - LON_MIN);

    let max_index = (1u64 << step) - 1;
    let ilat = ((lat_off * scale) as u64).min(max_index) as u32;
    let ilon = ((lon_off * scale) as u64).min(max_index) as u32;

    Ok(Cell {
        bits: interleave(ilat, ilon),
        step,
    })
}

/// Encodes a coordinate pair into its 52-bit score.
pub fn encode_score(lon: f64, lat: f64) -> Result<u64> {
    encode(lon, lat, MAX_STEP).map(|cell| cell.bits)
}

/// Geographic rectangle of a cell.
pub fn decode_bounds(cell: Cell) -> CellBounds {
    let scale = (1u64 << cell.step) as f64;
    let lat_unit = (LAT_MAX - LAT_MIN) / scale;
    let lon_unit = (LON_MAX - LON_MIN) / scale;

    let ilat = squash(cell.bits) as f64;
    let ilon = squash(cell.bits >> 1) as f64;

    CellBounds {
        min_lon: LON_MIN + ilon * lon_unit,
        min_lat: LAT_MIN + ilat * lat_unit,
        max_lon: LON_MIN + (ilon + 1.0) * lon_unit,
        max_lat: LAT_MIN + (ilat + 1.0) * lat_unit,
    }
}

/// Center point of a cell. Inverse of [`encode`] up to quantization error.
pub fn decode(cell: Cell) -> Point {
    let bounds = decode_bounds(cell);
    Point::new(
        (bounds.min_lon + bounds.max_lon) / 2.0,
        (bounds.min_lat + bounds.max_lat) / 2.0,
    )
}

/// Center point of a 52-bit score.
pub fn decode_score(score: u64) -> Point {
    decode(Cell {
        bits: score,
        step: MAX_STEP,
    })
}

/// Inclusive score range covered by a cell at any step.
pub fn cell_range(cell: Cell) -> CellRange {
    let shift = 2 * (MAX_STEP - cell.step) as u32;
    CellRange {
        min: cell.bits << shift,
        max: ((cell.bits + 1) << shift) - 1,
    }
}

/// The cell plus its eight adjacent cells at the same step.
pub fn neighbors(cell: Cell) -> Neighbors {
    let north = move_lat(cell, 1);
    let south = move_lat(cell, -1);
    let east = move_lon(cell, 1);
    let west = move_lon(cell, -1);

    Neighbors {
        center: cell,
        north,
        north_east: move_lon(north, 1),
        east,
        south_east: move_lon(south, 1),
        south,
        south_west: move_lon(south, -1),
        west,
        north_west: move_lon(north, -1),
    }
}

/// Quantization step whose 3x3 cell block around a point of the given
/// latitude is expected to cover a disc of `radius_meters`.
///
/// The estimate halves the Mercator extent until it drops under the radius,
/// then backs off two steps so cells are a few times wider than the radius.
/// Longitude cells shrink toward the poles, so high latitudes go coarser
/// still. Callers must verify actual coverage against the chosen step; this
/// is a starting point, not a guarantee.
pub fn estimate_step(radius_meters: f64, lat: f64) -> u8 {
    if radius_meters == 0.0 {
        return MAX_STEP;
    }

    let mut step: i32 = 1;
    let mut extent = radius_meters;
    while extent < MERCATOR_MAX {
        extent *= 2.0;
        step += 1;
    }
    step -= 2;

    if !(-66.0..=66.0).contains(&lat) {
        step -= 1;
        if !(-80.0..=80.0).contains(&lat) {
            step -= 1;
        }
    }

    step.clamp(1, MAX_STEP as i32) as u8
}

/// Shift one cell along the longitude axis. Wraps across the antimeridian.
fn move_lon(cell: Cell, delta: i8) -> Cell {
    if delta == 0 {
        return cell;
    }

    let width = 64 - cell.step as u32 * 2;
    let mut x = cell.bits & ODD_BITS;
    let y = cell.bits & EVEN_BITS;
    let zz = EVEN_BITS >> width;

    if delta > 0 {
        x = x.wrapping_add(zz + 1);
    } else {
        x |= zz;
        x = x.wrapping_sub(zz + 1);
    }

    x &= ODD_BITS >> width;
    Cell {
        bits: x | y,
        step: cell.step,
    }
}

/// Shift one cell along the latitude axis.
fn move_lat(cell: Cell, delta: i8) -> Cell {
    if delta == 0 {
        return cell;
    }

    let width = 64 - cell.step as u32 * 2;
    let x = cell.bits & ODD_BITS;
    let mut y = cell.bits & EVEN_BITS;
    let zz = ODD_BITS >> width;

    if delta > 0 {
        y = y.wrapping_add(zz + 1);
    } else {
        y |= zz;
        y = y.wrapping_sub(zz + 1);
    }

    y &= EVEN_BITS >> width;
    Cell {
        bits: x | y,
        step: cell.step,
    }
}

/// Spreads the low 32 bits of `v` over the even bit positions of a u64.
#[inline]
const fn spread(v: u32) -> u64 {
    let mut x = v as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & EVEN_BITS;
    x
}

/// Collapses the even bit positions of `v` back into the low 32 bits.
#[inline]
const fn squash(v: u64) -> u32 {
    let mut x = v & EVEN_BITS;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

#[inline]
const fn interleave(even: u32, odd: u32) -> u64 {
    spread(even) | (spread(odd) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_round_trip() {
        for v in [0u32, 1, 2, 0xDEAD, 0x03FF_FFFF, 0x0155_5555] {
            let bits = interleave(v, 0);
            assert_eq!(squash(bits), v);
            assert_eq!(squash(bits >> 1), 0);

            let bits = interleave(0, v);
            assert_eq!(squash(bits), 0);
            assert_eq!(squash(bits >> 1), v);
        }

        let bits = interleave(0x02AB_CDEF, 0x0312_3456);
        assert_eq!(squash(bits), 0x02AB_CDEF);
        assert_eq!(squash(bits >> 1), 0x0312_3456);
    }

    #[test]
    fn test_reference_scores_are_stable() {
        // Pinned values; a change here silently breaks every stored score.
        assert_eq!(
            encode_score(13.361389, 38.115556).unwrap(),
            3_479_099_956_230_698
        );
        assert_eq!(
            encode_score(15.087269, 37.502669).unwrap(),
            3_479_447_370_796_909
        );
    }

    #[test]
    fn test_scores_fit_in_52_bits() {
        for (lon, lat) in [
            (0.0, 0.0),
            (LON_MAX, LAT_MAX),
            (LON_MIN, LAT_MIN),
            (LON_MAX, LAT_MIN),
            (179.999999, 85.0511),
        ] {
            let score = encode_score(lon, lat).unwrap();
            assert!(score < 1u64 << 52, "({}, {}) -> {:#x}", lon, lat, score);
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let cases = [
            (13.361389, 38.115556),
            (-74.0060, 40.7128),
            (0.0, 0.0),
            (-179.99, -84.9),
            (179.99, 84.9),
        ];

        let lon_unit = (LON_MAX - LON_MIN) / (1u64 << MAX_STEP) as f64;
        let lat_unit = (LAT_MAX - LAT_MIN) / (1u64 << MAX_STEP) as f64;

        for (lon, lat) in cases {
            let cell = encode(lon, lat, MAX_STEP).unwrap();
            let center = decode(cell);
            assert!((center.x() - lon).abs() <= lon_unit, "lon {}", lon);
            assert!((center.y() - lat).abs() <= lat_unit, "lat {}", lat);
        }
    }

    #[test]
    fn test_decoded_center_reencodes_to_same_cell() {
        let cell = encode(15.087269, 37.502669, MAX_STEP).unwrap();
        let center = decode(cell);
        let again = encode(center.x(), center.y(), MAX_STEP).unwrap();
        assert_eq!(cell, again);
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(encode(200.0, 40.0, MAX_STEP).is_err());
        assert!(encode(-74.0, 90.0, MAX_STEP).is_err());
        assert!(encode(-74.0, -86.0, MAX_STEP).is_err());
        assert!(encode(f64::NAN, 40.0, MAX_STEP).is_err());
        assert!(encode(-74.0, f64::INFINITY, MAX_STEP).is_err());
    }

    #[test]
    fn test_boundary_coordinates_encode() {
        // Exact box corners land in the outermost cells.
        assert!(encode(LON_MAX, LAT_MAX, MAX_STEP).is_ok());
        assert!(encode(LON_MIN, LAT_MIN, MAX_STEP).is_ok());
        assert!(encode(LON_MIN, LAT_MAX, MAX_STEP).is_ok());
    }

    #[test]
    fn test_neighbors_move_and_return() {
        let cell = encode(13.361389, 38.115556, 15).unwrap();
        let east = move_lon(cell, 1);
        assert_ne!(cell, east);
        assert_eq!(move_lon(east, -1), cell);

        let north = move_lat(cell, 1);
        assert_ne!(cell, north);
        assert_eq!(move_lat(north, -1), cell);
    }

    #[test]
    fn test_neighbor_centers_are_one_cell_apart() {
        let cell = encode(13.361389, 38.115556, 15).unwrap();
        let bounds = decode_bounds(cell);
        let width = bounds.max_lon - bounds.min_lon;
        let height = bounds.max_lat - bounds.min_lat;

        let n = neighbors(cell);
        let center = decode(cell);
        let east = decode(n.east);
        let north = decode(n.north);

        assert!((east.x() - center.x() - width).abs() < 1e-9);
        assert!((east.y() - center.y()).abs() < 1e-9);
        assert!((north.y() - center.y() - height).abs() < 1e-9);
        assert!((north.x() - center.x()).abs() < 1e-9);
    }

    #[test]
    fn test_neighbors_wrap_across_antimeridian() {
        let cell = encode(179.999, 0.0, 10).unwrap();
        let east = decode(move_lon(cell, 1));
        assert!(east.x() < 0.0, "east of the antimeridian is negative: {}", east.x());

        let cell = encode(-179.999, 0.0, 10).unwrap();
        let west = decode(move_lon(cell, -1));
        assert!(west.x() > 0.0);
    }

    #[test]
    fn test_cell_range_at_max_step_is_single_score() {
        let cell = encode(13.361389, 38.115556, MAX_STEP).unwrap();
        let range = cell_range(cell);
        assert_eq!(range.min, range.max);
        assert_eq!(range.min, cell.bits);
    }

    #[test]
    fn test_cell_range_covers_contained_scores() {
        let coarse = encode(13.361389, 38.115556, 10).unwrap();
        let range = cell_range(coarse);
        let score = encode_score(13.361389, 38.115556).unwrap();
        assert!(range.min <= score && score <= range.max);

        // A point in a different coarse cell falls outside the range.
        let far = encode_score(-74.0060, 40.7128).unwrap();
        assert!(far < range.min || far > range.max);
    }

    #[test]
    fn test_estimate_step_shrinks_with_radius() {
        let near = estimate_step(10.0, 40.0);
        let mid = estimate_step(10_000.0, 40.0);
        let far = estimate_step(1_000_000.0, 40.0);
        assert!(near > mid);
        assert!(mid > far);
        assert!((1..=MAX_STEP).contains(&far));
    }

    #[test]
    fn test_estimate_step_coarser_near_poles() {
        let equator = estimate_step(10_000.0, 0.0);
        let arctic = estimate_step(10_000.0, 70.0);
        let polar = estimate_step(10_000.0, 84.0);
        assert!(arctic < equator);
        assert!(polar < arctic);
    }

    #[test]
    fn test_estimate_step_zero_radius() {
        assert_eq!(estimate_step(0.0, 0.0), MAX_STEP);
    }

    #[test]
    fn test_validate() {
        assert!(validate(0.0, 0.0).is_ok());
        assert!(validate(LON_MAX, LAT_MAX).is_ok());
        assert!(validate(180.0001, 0.0).is_err());
        assert!(validate(0.0, 85.06).is_err());
    }
}
