#![forbid(unsafe_code)]

//! Geographic coordinates and great-circle distance.
//!
//! # Invariants
//!
//! 1. A [`Coordinate`] built through [`Coordinate::new`] always holds finite
//!    values with latitude in `[-90, 90]` and longitude in `[-180, 180]`.
//! 2. [`Coordinate::distance_to`] is symmetric and zero for identical points.
//!
//! # Failure Modes
//!
//! | Condition | Result |
//! |-----------|--------|
//! | NaN or infinite component | `GeoError::NonFinite` |
//! | Latitude outside `[-90, 90]` | `GeoError::LatitudeOutOfRange` |
//! | Longitude outside `[-180, 180]` | `GeoError::LongitudeOutOfRange` |

use std::fmt;

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Errors from coordinate construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// A component was NaN or infinite.
    NonFinite,
    /// Latitude was outside `[-90, 90]`.
    LatitudeOutOfRange(f64),
    /// Longitude was outside `[-180, 180]`.
    LongitudeOutOfRange(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => write!(f, "coordinate component is not finite"),
            Self::LatitudeOutOfRange(lat) => write!(f, "latitude out of range: {lat}"),
            Self::LongitudeOutOfRange(lon) => write!(f, "longitude out of range: {lon}"),
        }
    }
}

impl std::error::Error for GeoError {}

/// A point on the earth's surface, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in meters (haversine).
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_RADIUS_M * c
    }

    /// Offset this coordinate by the given meters north and east.
    ///
    /// Uses an equirectangular approximation, accurate for the short
    /// offsets used to build search regions. The result is clamped into the
    /// valid coordinate range.
    #[must_use]
    pub fn offset_by_meters(&self, north_m: f64, east_m: f64) -> Self {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = self.latitude.to_radians().cos().max(f64::EPSILON);
        let dlon = (east_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();
        Self {
            latitude: (self.latitude + dlat).clamp(-90.0, 90.0),
            longitude: (self.longitude + dlon).clamp(-180.0, 180.0),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}
