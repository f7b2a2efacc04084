#![forbid(unsafe_code)]

//! Human-readable distance and address labels.
//!
//! Distances below one kilometer render in meters (`"12.5 m"`), everything
//! else in kilometers (`"1.23 km"`). Fraction digits are capped by
//! [`DistanceFormat::max_fraction_digits`] and trailing zeros are trimmed.
//! The unit is picked after rounding, so `999.999` renders as `"1 km"`, never
//! `"1000 m"`.

/// Label used when a distance cannot be computed.
pub const UNAVAILABLE: &str = "N/A";

const METERS_PER_KM: f64 = 1000.0;

/// Configuration for distance labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceFormat {
    /// Maximum number of digits after the decimal point.
    pub max_fraction_digits: u8,
}

impl Default for DistanceFormat {
    fn default() -> Self {
        Self {
            max_fraction_digits: 2,
        }
    }
}

impl DistanceFormat {
    /// Create a format with the given fraction digit cap.
    #[must_use]
    pub const fn new(max_fraction_digits: u8) -> Self {
        Self {
            max_fraction_digits,
        }
    }

    /// Set the fraction digit cap.
    #[must_use]
    pub const fn with_max_fraction_digits(mut self, digits: u8) -> Self {
        self.max_fraction_digits = digits;
        self
    }

    /// Format a distance given in meters.
    ///
    /// Non-finite input yields [`UNAVAILABLE`]; negative input is treated
    /// as zero.
    #[must_use]
    pub fn format(&self, meters: f64) -> String {
        if !meters.is_finite() {
            return UNAVAILABLE.to_string();
        }
        let meters = if meters > 0.0 { meters } else { 0.0 };
        let digits = usize::from(self.max_fraction_digits);

        let in_meters = trim_number(format!("{meters:.digits$}"));
        if in_meters.parse::<f64>().unwrap_or(f64::MAX) < METERS_PER_KM {
            return format!("{in_meters} m");
        }
        let km = meters / METERS_PER_KM;
        format!("{} km", trim_number(format!("{km:.digits$}")))
    }
}

/// Format `meters` with the default [`DistanceFormat`].
#[must_use]
pub fn format_distance(meters: f64) -> String {
    DistanceFormat::default().format(meters)
}

/// Join a street number and street name into a single line.
///
/// The separating space appears only when both parts are present.
#[must_use]
pub fn address_line(sub_thoroughfare: Option<&str>, thoroughfare: Option<&str>) -> String {
    match (sub_thoroughfare, thoroughfare) {
        (Some(number), Some(street)) => format!("{number} {street}"),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => String::new(),
    }
}

fn trim_number(mut s: String) -> String {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    s
}
