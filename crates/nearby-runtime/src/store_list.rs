#![forbid(unsafe_code)]

//! Store list view-model.
//!
//! [`StoreList`] waits for the first location fix, searches for stores
//! around it once, and exposes one [`StoreRow`] per result. Each row
//! observes the location and keeps a live distance label.
//!
//! # Lifecycle
//!
//! ```text
//! start() ──INITIAL──▶ handler: fix? ──no──▶ wait
//!                                │yes
//!                                ▼
//!                  unregister self, search, store results
//!
//! sync_rows(): recycle rows (prepare_for_reuse + bind), drop extras
//! ```
//!
//! Rows are recycled the way a table view recycles cells: a reused row
//! first drops all its observations, so it never accumulates handlers.

use std::cell::RefCell;
use std::rc::Rc;

use nearby_core::format::UNAVAILABLE;
use nearby_core::{Coordinate, DistanceFormat};
use tracing::{debug, info, warn};

use crate::location::LocationController;
use crate::reactive::{DisposeBag, ObservableOptions, Observer, ObserverId, ObserverState};
use crate::search::{PlaceSearch, Placemark, SearchError, SearchRequest};

/// One row: an address and a live distance label.
#[derive(Debug)]
pub struct StoreRow {
    observer: ObserverState,
    address: String,
    detail: Rc<RefCell<String>>,
    format: DistanceFormat,
}

impl Default for StoreRow {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreRow {
    /// An unbound row using the default distance format.
    #[must_use]
    pub fn new() -> Self {
        Self::with_format(DistanceFormat::default())
    }

    /// An unbound row using `format` for its distance label.
    #[must_use]
    pub fn with_format(format: DistanceFormat) -> Self {
        Self {
            observer: ObserverState::new(),
            address: String::new(),
            detail: Rc::new(RefCell::new(String::new())),
            format,
        }
    }

    /// Show `placemark` and track its distance from the current location.
    ///
    /// The label is filled immediately and then on every location change.
    /// It reads [`UNAVAILABLE`] while there is no fix or the placemark has
    /// no coordinate.
    pub fn bind(&mut self, placemark: &Placemark, locations: &LocationController) {
        self.address = placemark.address();
        let detail = Rc::clone(&self.detail);
        let target = placemark.coordinate;
        let format = self.format;

        locations.add_location_observer(self, ObservableOptions::INITIAL, move |location, _| {
            let label = match (location, target) {
                (Some(here), Some(there)) => format.format(there.distance_to(here)),
                _ => UNAVAILABLE.to_string(),
            };
            *detail.borrow_mut() = label;
        });
    }

    /// Drop every observation and clear the labels.
    pub fn prepare_for_reuse(&mut self) {
        self.remove_all_observations();
        self.address.clear();
        self.detail.borrow_mut().clear();
    }

    /// Street address line.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current distance label.
    #[must_use]
    pub fn detail(&self) -> String {
        self.detail.borrow().clone()
    }

    /// Number of live subscriptions held by this row.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.observer.subscription_count()
    }
}

impl Observer for StoreRow {
    fn observer_id(&self) -> ObserverId {
        self.observer.id()
    }

    fn dispose_bag_mut(&mut self) -> &mut DisposeBag {
        self.observer.bag_mut()
    }
}

/// State written from inside the location handler.
#[derive(Debug, Default)]
struct ListState {
    loaded: bool,
    placemarks: Vec<Placemark>,
    last_error: Option<SearchError>,
    /// Bumped on every successful load.
    generation: u64,
}

/// Searches once the first fix arrives and keeps a row per result.
pub struct StoreList {
    observer: ObserverState,
    locations: LocationController,
    search: Rc<dyn PlaceSearch>,
    request: SearchRequest,
    format: DistanceFormat,
    state: Rc<RefCell<ListState>>,
    rows: Vec<StoreRow>,
    rows_generation: u64,
}

impl std::fmt::Debug for StoreList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreList")
            .field("observer", &self.observer)
            .field("request", &self.request)
            .field("state", &self.state.borrow())
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl StoreList {
    /// Create an idle list. Call [`start`](Self::start) to begin watching
    /// the location.
    ///
    /// `request` supplies the keyword and region size; its center is
    /// replaced by the location fix at search time.
    #[must_use]
    pub fn new(
        locations: LocationController,
        search: Rc<dyn PlaceSearch>,
        request: SearchRequest,
    ) -> Self {
        Self {
            observer: ObserverState::new(),
            locations,
            search,
            request,
            format: DistanceFormat::default(),
            state: Rc::default(),
            rows: Vec::new(),
            rows_generation: 0,
        }
    }

    /// Set the distance format used by rows created from now on.
    #[must_use]
    pub fn with_format(mut self, format: DistanceFormat) -> Self {
        self.format = format;
        self
    }

    /// Watch the location until the first fix, then load stores around it.
    ///
    /// If a fix is already available the search runs before this returns.
    pub fn start(&mut self) {
        let state = Rc::clone(&self.state);
        let search = Rc::clone(&self.search);
        let request = self.request.clone();
        let weak = self.locations.downgrade();
        let id = self.observer_id();

        let locations = self.locations.clone();
        locations.add_location_observer(self, ObservableOptions::INITIAL, move |location, _| {
            let unregister = || {
                if let Some(observable) = weak.upgrade() {
                    observable.remove_observer(id);
                }
            };
            if state.borrow().loaded {
                unregister();
                return;
            }
            let Some(here) = location else {
                debug!("waiting for first location fix");
                return;
            };
            state.borrow_mut().loaded = true;
            unregister();
            load_placemarks(&state, search.as_ref(), &request, *here);
        });
    }

    /// Re-run the search around the current fix.
    ///
    /// Returns `false` (and does nothing) while there is no fix.
    pub fn refresh(&mut self) -> bool {
        let Some(here) = self.locations.location() else {
            return false;
        };
        self.state.borrow_mut().loaded = true;
        load_placemarks(&self.state, self.search.as_ref(), &self.request, here);
        true
    }

    /// Whether the first search has been issued.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    /// Current results.
    #[must_use]
    pub fn placemarks(&self) -> Vec<Placemark> {
        self.state.borrow().placemarks.clone()
    }

    /// Error from the most recent search, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<SearchError> {
        self.state.borrow().last_error.clone()
    }

    /// Whether results changed since the last [`sync_rows`](Self::sync_rows).
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        self.state.borrow().generation != self.rows_generation
    }

    /// Rebind rows to the current results if they changed.
    ///
    /// Existing rows are recycled in order; surplus rows are dropped, which
    /// releases their observations. Returns whether anything was rebound.
    pub fn sync_rows(&mut self) -> bool {
        if !self.needs_sync() {
            return false;
        }
        let (placemarks, generation) = {
            let state = self.state.borrow();
            (state.placemarks.clone(), state.generation)
        };

        self.rows.truncate(placemarks.len());
        for (index, placemark) in placemarks.iter().enumerate() {
            if let Some(row) = self.rows.get_mut(index) {
                row.prepare_for_reuse();
                row.bind(placemark, &self.locations);
            } else {
                let mut row = StoreRow::with_format(self.format);
                row.bind(placemark, &self.locations);
                self.rows.push(row);
            }
        }
        self.rows_generation = generation;
        debug!(rows = self.rows.len(), "rows synced");
        true
    }

    /// Bound rows.
    #[must_use]
    pub fn rows(&self) -> &[StoreRow] {
        &self.rows
    }

    /// Row at `index`, if bound.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&StoreRow> {
        self.rows.get(index)
    }

    /// Number of bound rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl Observer for StoreList {
    fn observer_id(&self) -> ObserverId {
        self.observer.id()
    }

    fn dispose_bag_mut(&mut self) -> &mut DisposeBag {
        self.observer.bag_mut()
    }
}

fn load_placemarks(
    state: &RefCell<ListState>,
    search: &dyn PlaceSearch,
    template: &SearchRequest,
    near: Coordinate,
) {
    let request = template.centered_on(near);
    match search.search(&request) {
        Ok(placemarks) => {
            info!(
                count = placemarks.len(),
                keyword = %request.keyword,
                "loaded placemarks"
            );
            let mut state = state.borrow_mut();
            state.placemarks = placemarks;
            state.last_error = None;
            state.generation += 1;
        }
        Err(err) => {
            warn!(error = %err, keyword = %request.keyword, "place search failed");
            state.borrow_mut().last_error = Some(err);
        }
    }
}
