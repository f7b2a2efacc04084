#![forbid(unsafe_code)]

//! Location producer.
//!
//! [`LocationController`] owns the `Observable<Option<Coordinate>>` that the
//! rest of the app watches. It starts empty (`None` means "no fix yet") and
//! is written only through [`did_update_locations`], which applies the
//! configured distance filter.
//!
//! Position sources that deliver fixes on another thread must hand them to
//! the owning thread before calling [`did_update_locations`].
//!
//! [`did_update_locations`]: LocationController::did_update_locations

use nearby_core::Coordinate;
use tracing::{debug, info};

use crate::reactive::{Observable, ObservableOptions, Observer, WeakObservable};

/// Configuration for [`LocationController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationConfig {
    /// Minimum movement in meters before a new fix is published.
    pub distance_filter_m: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            distance_filter_m: 10.0,
        }
    }
}

impl LocationConfig {
    /// Create a configuration with the given distance filter.
    #[must_use]
    pub const fn new(distance_filter_m: f64) -> Self {
        Self { distance_filter_m }
    }

    /// Set the distance filter.
    #[must_use]
    pub const fn with_distance_filter(mut self, meters: f64) -> Self {
        self.distance_filter_m = meters;
        self
    }

    /// Publish every fix regardless of movement.
    #[must_use]
    pub const fn unfiltered() -> Self {
        Self {
            distance_filter_m: 0.0,
        }
    }
}

/// Publishes the device location to observers.
///
/// Cloning shares the underlying observable.
#[derive(Clone)]
pub struct LocationController {
    config: LocationConfig,
    location: Observable<Option<Coordinate>>,
}

impl std::fmt::Debug for LocationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationController")
            .field("config", &self.config)
            .field("location", &self.location)
            .finish()
    }
}

impl Default for LocationController {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationController {
    /// Controller with the default configuration and no fix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LocationConfig::default())
    }

    /// Controller with a custom configuration and no fix.
    #[must_use]
    pub fn with_config(config: LocationConfig) -> Self {
        Self {
            config,
            location: Observable::new(None),
        }
    }

    /// The most recently published fix, if any.
    #[must_use]
    pub fn location(&self) -> Option<Coordinate> {
        self.location.get()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// Feed a batch of fixes, newest last.
    ///
    /// Only the newest fix is considered. It is published unless it lies
    /// within the distance filter of the current fix. Returns whether the
    /// observable was written.
    pub fn did_update_locations(&self, fixes: &[Coordinate]) -> bool {
        let Some(latest) = fixes.last().copied() else {
            return false;
        };
        if let Some(current) = self.location.get() {
            let moved = current.distance_to(&latest);
            if moved < self.config.distance_filter_m {
                debug!(
                    moved_m = moved,
                    filter_m = self.config.distance_filter_m,
                    "fix within distance filter, not published"
                );
                return false;
            }
        }
        info!(
            latitude = latest.latitude(),
            longitude = latest.longitude(),
            "location updated"
        );
        self.location.set(Some(latest));
        true
    }

    /// Register `observer` for location changes.
    pub fn add_location_observer<O: Observer>(
        &self,
        observer: &mut O,
        options: ObservableOptions,
        handler: impl Fn(&Option<Coordinate>, Option<&Option<Coordinate>>) + 'static,
    ) {
        observer.observe(&self.location, options, handler);
    }

    /// Stop delivering location changes to `observer`.
    pub fn remove_location_observer<O: Observer>(&self, observer: &O) {
        self.location.remove_observer(observer.observer_id());
    }

    /// Number of registered location observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.location.observer_count()
    }

    /// Non-owning handle, for handlers that unregister themselves.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<Option<Coordinate>> {
        self.location.downgrade()
    }
}
