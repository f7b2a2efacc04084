#![forbid(unsafe_code)]

//! Place search seam.
//!
//! Real map search lives outside this crate. [`PlaceSearch`] is the boundary
//! a search backend implements; [`StaticPlaceSearch`] answers from a fixed
//! catalog and backs the tests and the demo.
//!
//! # Failure Modes
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Blank keyword | `SearchError::EmptyKeyword` |
//! | Backend failure | `SearchError::Unavailable(reason)` |
//! | No matches | `Ok(vec![])` |

use std::fmt;

use nearby_core::{Coordinate, address_line};

/// Side length of the default search square, in meters.
pub const DEFAULT_REGION_SIDE_M: f64 = 10_000.0;

/// Keyword searched for when none is configured.
pub const DEFAULT_KEYWORD: &str = "Starbucks";

/// Errors from place search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The request keyword was empty or whitespace.
    EmptyKeyword,
    /// The backend could not answer.
    Unavailable(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKeyword => write!(f, "search keyword is empty"),
            Self::Unavailable(reason) => write!(f, "search unavailable: {reason}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// A search result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placemark {
    pub name: String,
    /// Street number, e.g. `"1912"`.
    pub sub_thoroughfare: Option<String>,
    /// Street name, e.g. `"Pike Pl"`.
    pub thoroughfare: Option<String>,
    pub coordinate: Option<Coordinate>,
}

impl Placemark {
    /// A placemark with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the street number and name.
    #[must_use]
    pub fn with_street(mut self, number: impl Into<String>, street: impl Into<String>) -> Self {
        self.sub_thoroughfare = Some(number.into());
        self.thoroughfare = Some(street.into());
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Single-line street address.
    #[must_use]
    pub fn address(&self) -> String {
        address_line(self.sub_thoroughfare.as_deref(), self.thoroughfare.as_deref())
    }
}

/// An axis-aligned square around a center point.
///
/// Regions spanning the antimeridian are not supported; the square is
/// clipped to the valid coordinate range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRegion {
    pub center: Coordinate,
    pub side_length_m: f64,
}

impl SearchRegion {
    /// A default-sized region around `center`.
    #[must_use]
    pub const fn around(center: Coordinate) -> Self {
        Self {
            center,
            side_length_m: DEFAULT_REGION_SIDE_M,
        }
    }

    /// Set the side length.
    #[must_use]
    pub const fn with_side_length(mut self, meters: f64) -> Self {
        self.side_length_m = meters;
        self
    }

    /// Whether `point` lies inside the square (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        let half = self.side_length_m / 2.0;
        let north_east = self.center.offset_by_meters(half, half);
        let south_west = self.center.offset_by_meters(-half, -half);
        (south_west.latitude()..=north_east.latitude()).contains(&point.latitude())
            && (south_west.longitude()..=north_east.longitude()).contains(&point.longitude())
    }
}

/// What to search for and where.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub keyword: String,
    pub region: SearchRegion,
}

impl SearchRequest {
    /// Search for the default keyword in `region`.
    #[must_use]
    pub fn new(region: SearchRegion) -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_string(),
            region,
        }
    }

    /// Set the keyword.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Same keyword and region size, moved to `center`.
    #[must_use]
    pub fn centered_on(&self, center: Coordinate) -> Self {
        Self {
            keyword: self.keyword.clone(),
            region: SearchRegion {
                center,
                ..self.region
            },
        }
    }
}

/// A place search backend.
pub trait PlaceSearch {
    /// Run `request`, returning matches in backend order.
    fn search(&self, request: &SearchRequest) -> Result<Vec<Placemark>, SearchError>;
}

/// Answers from a fixed catalog.
///
/// A placemark matches when its name contains the keyword
/// (case-insensitive) and its coordinate lies in the region. Placemarks
/// without a coordinate never match.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceSearch {
    catalog: Vec<Placemark>,
}

impl StaticPlaceSearch {
    /// Search over `catalog`.
    #[must_use]
    pub fn new(catalog: Vec<Placemark>) -> Self {
        Self { catalog }
    }

    /// Number of entries in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl PlaceSearch for StaticPlaceSearch {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Placemark>, SearchError> {
        let keyword = request.keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        Ok(self
            .catalog
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&keyword))
            .filter(|p| p.coordinate.is_some_and(|c| request.region.contains(&c)))
            .cloned()
            .collect())
    }
}
