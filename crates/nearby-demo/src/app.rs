#![forbid(unsafe_code)]

//! Scripted walk through the store list.
//!
//! The app starts a [`StoreList`], publishes a first fix, then walks north
//! in fixed steps. After every step it syncs rows and prints a frame, so the
//! distance labels can be seen updating through the observable.

use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use nearby_core::{Coordinate, DistanceFormat, GeoError};
use nearby_runtime::{
    LocationConfig, LocationController, PlaceSearch, Placemark, SearchRegion, SearchRequest,
    StaticPlaceSearch, StoreList,
};
use tracing::info;

use crate::cli::Opts;

/// Errors from building the demo.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// The starting position was not a valid coordinate.
    InvalidStart(GeoError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStart(err) => write!(f, "invalid start position: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidStart(err) => Some(err),
        }
    }
}

impl From<GeoError> for AppError {
    fn from(err: GeoError) -> Self {
        Self::InvalidStart(err)
    }
}

/// A fixed set of stores scattered around `center`.
#[must_use]
pub fn sample_catalog(center: Coordinate) -> Vec<Placemark> {
    vec![
        Placemark::new("Starbucks")
            .with_street("1124", "Pike St")
            .with_coordinate(center.offset_by_meters(300.0, 0.0)),
        Placemark::new("Starbucks Reserve")
            .with_street("1912", "Pike Pl")
            .with_coordinate(center.offset_by_meters(-400.0, 250.0)),
        Placemark::new("Starbucks")
            .with_street("400", "Broad St")
            .with_coordinate(center.offset_by_meters(1_800.0, -900.0)),
        Placemark::new("Victrola Coffee")
            .with_street("310", "E Pike St")
            .with_coordinate(center.offset_by_meters(100.0, 1_200.0)),
        Placemark::new("Starbucks Airport")
            .with_coordinate(center.offset_by_meters(-19_000.0, 0.0)),
    ]
}

/// The demo: a location feed, a store list, and a walk script.
pub struct DemoApp {
    locations: LocationController,
    list: StoreList,
    start: Coordinate,
    steps: u32,
    step_m: f64,
}

impl fmt::Debug for DemoApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoApp")
            .field("locations", &self.locations)
            .field("start", &self.start)
            .field("steps", &self.steps)
            .field("step_m", &self.step_m)
            .finish_non_exhaustive()
    }
}

impl DemoApp {
    /// Build the demo from parsed options, searching the sample catalog.
    pub fn from_opts(opts: &Opts) -> Result<Self, AppError> {
        let start = Coordinate::new(opts.start.0, opts.start.1)?;
        let search: Rc<dyn PlaceSearch> = Rc::new(StaticPlaceSearch::new(sample_catalog(start)));
        Ok(Self::new(opts, start, search))
    }

    /// Build the demo with a custom search backend.
    #[must_use]
    pub fn new(opts: &Opts, start: Coordinate, search: Rc<dyn PlaceSearch>) -> Self {
        let locations = LocationController::with_config(
            LocationConfig::default().with_distance_filter(opts.distance_filter_m),
        );
        let request =
            SearchRequest::new(SearchRegion::around(start)).with_keyword(opts.keyword.clone());
        let list = StoreList::new(locations.clone(), search, request)
            .with_format(DistanceFormat::new(opts.digits));
        Self {
            locations,
            list,
            start,
            steps: opts.steps,
            step_m: opts.step_m,
        }
    }

    /// Run the whole script, writing one frame per step to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.list.start();
        self.render(out, "waiting for location")?;

        self.locations.did_update_locations(&[self.start]);
        self.list.sync_rows();
        self.render(out, "first fix")?;

        for step in 1..=self.steps {
            let here = self
                .start
                .offset_by_meters(self.step_m * f64::from(step), 0.0);
            let published = self.locations.did_update_locations(&[here]);
            self.list.sync_rows();
            let title = if published {
                format!("step {step}")
            } else {
                format!("step {step} (filtered)")
            };
            self.render(out, &title)?;
        }
        info!(steps = self.steps, rows = self.list.row_count(), "walk finished");
        Ok(())
    }

    /// Write the current list as a frame titled `title`.
    pub fn render<W: Write>(&self, out: &mut W, title: &str) -> io::Result<()> {
        writeln!(out, "== {title} ==")?;
        match self.locations.location() {
            Some(here) => writeln!(out, "location: {here}")?,
            None => writeln!(out, "location: unknown")?,
        }
        if let Some(err) = self.list.last_error() {
            writeln!(out, "search failed: {err}")?;
        }
        if self.list.row_count() == 0 {
            writeln!(out, "(no stores)")?;
        }
        for row in self.list.rows() {
            writeln!(out, "{:<28}{:>10}", row.address(), row.detail())?;
        }
        Ok(())
    }

    /// The store list being driven.
    #[must_use]
    pub fn list(&self) -> &StoreList {
        &self.list
    }
}
