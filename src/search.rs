//! Radius search: disc covering, candidate scanning, and result shaping.
//!
//! A query resolves its center, converts the radius to meters, and covers
//! the search disc with a 3x3 block of quantization cells. The block's cell
//! ranges are merged and scanned against the ordered store, and every
//! candidate is re-checked with the exact haversine distance. The cell
//! covering is a superset of the disc, never a substitute for filtering.

use crate::codec::{self, CellBounds, CellRange, MAX_STEP};
use crate::config::Config;
use crate::distance::{EARTH_RADIUS_METERS, Unit, haversine};
use crate::error::{GeoError, Result};
use crate::store::SpatialStore;
use bytes::Bytes;
use geo::Point;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Result ordering for radius searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Scan order. Deterministic for an unmodified index.
    #[default]
    Unsorted,
    /// Nearest first.
    Ascending,
    /// Farthest first.
    Descending,
}

/// Search center: raw coordinates or an existing member's position.
#[derive(Debug, Clone)]
enum Center {
    Position(Point),
    Member(Bytes),
}

/// A radius query against a [`GeoSet`](crate::GeoSet).
///
/// # Examples
///
/// ```rust
/// use georadix::{RadiusQuery, SortOrder, Unit};
///
/// let query = RadiusQuery::around(13.361389, 38.115556, 200.0, Unit::Kilometers)
///     .order(SortOrder::Ascending)
///     .limit(10)
///     .with_distance();
/// ```
#[derive(Debug, Clone)]
pub struct RadiusQuery {
    center: Center,
    radius: f64,
    unit: Unit,
    limit: Option<usize>,
    order: SortOrder,
    with_coordinates: bool,
    with_distance: bool,
    with_geocode: bool,
}

impl RadiusQuery {
    /// Query around raw coordinates.
    pub fn around(lon: f64, lat: f64, radius: f64, unit: Unit) -> Self {
        Self::new(Center::Position(Point::new(lon, lat)), radius, unit)
    }

    /// Query around the position of an existing member.
    ///
    /// Running the query fails with [`GeoError::MemberNotFound`] if the
    /// member is absent at that point.
    pub fn around_member(member: impl AsRef<[u8]>, radius: f64, unit: Unit) -> Self {
        Self::new(
            Center::Member(Bytes::copy_from_slice(member.as_ref())),
            radius,
            unit,
        )
    }

    fn new(center: Center, radius: f64, unit: Unit) -> Self {
        Self {
            center,
            radius,
            unit,
            limit: None,
            order: SortOrder::default(),
            with_coordinates: false,
            with_distance: false,
            with_geocode: false,
        }
    }

    /// Cap the number of returned results.
    ///
    /// A limit without an explicit order implies ascending distance, so the
    /// returned results are the `n` nearest matches.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set the result ordering.
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Annotate results with the exact stored coordinates.
    pub fn with_coordinates(mut self) -> Self {
        self.with_coordinates = true;
        self
    }

    /// Annotate results with the distance from the center, in the query unit.
    pub fn with_distance(mut self) -> Self {
        self.with_distance = true;
        self
    }

    /// Annotate results with the member's 52-bit geocode.
    pub fn with_geocode(mut self) -> Self {
        self.with_geocode = true;
        self
    }

    pub(crate) fn run(&self, store: &SpatialStore, config: &Config) -> Result<Vec<SearchResult>> {
        let center = match &self.center {
            Center::Position(point) => {
                codec::validate(point.x(), point.y())?;
                *point
            }
            Center::Member(member) => store
                .position(member)
                .ok_or_else(|| GeoError::member_not_found(member))?,
        };

        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(GeoError::InvalidParameter(format!(
                "radius must be finite and non-negative, got {}",
                self.radius
            )));
        }

        if self.limit == Some(0) {
            return Ok(Vec::new());
        }

        let radius_meters = self.unit.to_meters(self.radius);
        let mut matches = collect_matches(store, &center, radius_meters, config.search_step)?;

        match (self.order, self.limit) {
            (SortOrder::Ascending, _) | (SortOrder::Unsorted, Some(_)) => {
                matches.sort_by(|a, b| {
                    a.distance
                        .partial_cmp(&b.distance)
                        .unwrap_or(Ordering::Equal)
                });
            }
            (SortOrder::Descending, _) => {
                matches.sort_by(|a, b| {
                    b.distance
                        .partial_cmp(&a.distance)
                        .unwrap_or(Ordering::Equal)
                });
            }
            (SortOrder::Unsorted, None) => {}
        }

        if let Some(limit) = self.limit {
            matches.truncate(limit);
        }

        Ok(matches
            .into_iter()
            .map(|m| SearchResult {
                member: m.member,
                distance: self.with_distance.then(|| self.unit.from_meters(m.distance)),
                point: self.with_coordinates.then_some(m.point),
                geocode: self.with_geocode.then_some(m.score),
            })
            .collect())
    }
}

/// One entry of a radius search result set.
///
/// The member identifier is always present; the annotations mirror the
/// query's `with_*` flags. Distances are in the query's unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub member: Bytes,
    pub distance: Option<f64>,
    pub point: Option<Point>,
    pub geocode: Option<u64>,
}

struct RawMatch {
    member: Bytes,
    point: Point,
    score: u64,
    distance: f64,
}

fn collect_matches(
    store: &SpatialStore,
    center: &Point,
    radius_meters: f64,
    step_hint: Option<u8>,
) -> Result<Vec<RawMatch>> {
    let ranges = cover_radius(center, radius_meters, step_hint)?;

    let mut matches = Vec::new();
    for range in &ranges {
        for (score, member) in store.range_scan(range.min, range.max) {
            let Some(entry) = store.entry(member) else {
                continue;
            };
            let distance = haversine(center, &entry.point);
            if distance <= radius_meters {
                matches.push(RawMatch {
                    member: member.clone(),
                    point: entry.point,
                    score,
                    distance,
                });
            }
        }
    }

    Ok(matches)
}

/// Merged, deduplicated score ranges whose union covers the disc of
/// `radius_meters` around `center`.
fn cover_radius(
    center: &Point,
    radius_meters: f64,
    step_hint: Option<u8>,
) -> Result<SmallVec<[CellRange; 9]>> {
    let mut step = step_hint
        .unwrap_or_else(|| codec::estimate_step(radius_meters, center.y()))
        .clamp(1, MAX_STEP);

    let cell = loop {
        let cell = codec::encode(center.x(), center.y(), step)?;
        if step == 1 || covers_disc(center, radius_meters, &codec::decode_bounds(cell)) {
            break cell;
        }
        step -= 1;
        log::debug!(
            "search cells too narrow for radius {radius_meters}m, widening to step {step}"
        );
    };

    let block = codec::neighbors(cell);
    let ranges: SmallVec<[CellRange; 9]> =
        block.cells().iter().map(|c| codec::cell_range(*c)).collect();
    Ok(merge_ranges(ranges))
}

/// Whether the 3x3 block around a cell with these bounds contains the whole
/// disc, by comparing the block rectangle against the disc's geographic
/// bounding box.
///
/// The box is exact spherical-cap geometry: the latitude span is the
/// angular radius, and the longitude half-span is asin(sin d / cos lat),
/// which peaks poleward of the center latitude. A disc that reaches a pole
/// spans every longitude, so only a block that wraps the full circle (three
/// cells of at least 360 degrees, i.e. step 1) can cover it.
fn covers_disc(center: &Point, radius_meters: f64, bounds: &CellBounds) -> bool {
    let width = bounds.max_lon - bounds.min_lon;
    let height = bounds.max_lat - bounds.min_lat;

    let block_top = bounds.max_lat + height;
    let block_bottom = bounds.min_lat - height;
    let block_right = bounds.max_lon + width;
    let block_left = bounds.min_lon - width;

    let angular_radius = radius_meters / EARTH_RADIUS_METERS;
    let delta = angular_radius.to_degrees();
    let disc_top = (center.y() + delta).min(codec::LAT_MAX);
    let disc_bottom = (center.y() - delta).max(codec::LAT_MIN);
    if block_top < disc_top || block_bottom > disc_bottom {
        return false;
    }

    let wraps_fully = 3.0 * width >= 360.0;
    if center.y().abs() + delta >= 90.0 {
        return wraps_fully;
    }

    let half_span = (angular_radius.sin() / center.y().to_radians().cos())
        .min(1.0)
        .asin()
        .to_degrees();
    wraps_fully
        || (block_left <= center.x() - half_span && block_right >= center.x() + half_span)
}

fn merge_ranges(mut ranges: SmallVec<[CellRange; 9]>) -> SmallVec<[CellRange; 9]> {
    ranges.sort_by_key(|r| r.min);
    ranges.dedup();

    let mut merged: SmallVec<[CellRange; 9]> = SmallVec::new();
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.min <= last.max.saturating_add(1) => {
                if range.max > last.max {
                    last.max = range.max;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}
