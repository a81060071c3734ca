//! Error types for georadix.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors produced by index operations.
///
/// Every operation is all-or-nothing: an error never leaves the ordered
/// geocode map and the reverse member map out of step with each other.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Coordinate outside the indexable bounding box
    /// ([-180, 180] longitude, [-85.05112878, 85.05112878] latitude),
    /// or not a finite number.
    #[error("coordinate out of range: longitude {lon}, latitude {lat}")]
    OutOfRange { lon: f64, lat: f64 },

    /// A referenced member is absent from the index.
    #[error("member not found: {0}")]
    MemberNotFound(String),

    /// A query parameter is malformed (negative radius, unknown unit, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Snapshot file does not carry the expected magic/version header.
    #[cfg(feature = "snapshot")]
    #[error("invalid snapshot format")]
    InvalidFormat,

    /// Snapshot payload could not be encoded or decoded.
    #[cfg(feature = "snapshot")]
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying I/O failure while reading or writing a snapshot.
    #[cfg(feature = "snapshot")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoError {
    /// Build a `MemberNotFound` from an opaque member identifier.
    pub(crate) fn member_not_found(member: &[u8]) -> Self {
        GeoError::MemberNotFound(String::from_utf8_lossy(member).into_owned())
    }
}
