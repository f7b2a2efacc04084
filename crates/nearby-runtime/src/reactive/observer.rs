#![forbid(unsafe_code)]

//! Observer identity and the observe/cleanup helpers.
//!
//! Anything that owns a [`DisposeBag`] and a stable [`ObserverId`] can
//! implement [`Observer`] and get [`observe`](Observer::observe) and
//! [`remove_all_observations`](Observer::remove_all_observations) for free.
//! The capability is composition, not inheritance: embed an
//! [`ObserverState`] (or the two fields) and forward the accessors.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use super::dispose::DisposeBag;
use super::observable::{Observable, ObservableOptions};

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an observer instance.
///
/// Identities are never reused, so two distinct observers never collide,
/// and an observer keeps its identity for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(NonZeroU64);

impl ObserverId {
    /// Allocate a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        let raw = NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 allocations to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// An entity that owns a [`DisposeBag`] and can observe [`Observable`]s.
///
/// # Example
///
/// ```
/// use nearby_runtime::reactive::{Observable, ObservableOptions, Observer, ObserverState};
///
/// struct Badge {
///     state: ObserverState,
/// }
///
/// impl Observer for Badge {
///     fn observer_id(&self) -> nearby_runtime::reactive::ObserverId {
///         self.state.id()
///     }
///     fn dispose_bag_mut(&mut self) -> &mut nearby_runtime::reactive::DisposeBag {
///         self.state.bag_mut()
///     }
/// }
///
/// let count = Observable::new(0);
/// let mut badge = Badge { state: ObserverState::new() };
/// badge.observe(&count, ObservableOptions::empty(), |new, _| println!("{new}"));
/// assert_eq!(count.observer_count(), 1);
///
/// badge.remove_all_observations();
/// assert_eq!(count.observer_count(), 0);
/// ```
pub trait Observer {
    /// Stable identity used as the registration key.
    fn observer_id(&self) -> ObserverId;

    /// The bag that owns this observer's tokens.
    fn dispose_bag_mut(&mut self) -> &mut DisposeBag;

    /// Register `handler` on `observable` and keep the token in this
    /// observer's bag.
    fn observe<T: Clone + 'static>(
        &mut self,
        observable: &Observable<T>,
        options: ObservableOptions,
        handler: impl Fn(&T, Option<&T>) + 'static,
    ) {
        let id = self.observer_id();
        observable
            .add_observer(id, options, handler)
            .disposed_by(self.dispose_bag_mut());
    }

    /// Replace the bag with an empty one, unregistering from everything this
    /// observer had subscribed to.
    fn remove_all_observations(&mut self) {
        let previous = std::mem::take(self.dispose_bag_mut());
        drop(previous);
    }
}

/// Identity plus bag: the state every [`Observer`] needs.
#[derive(Debug)]
pub struct ObserverState {
    id: ObserverId,
    bag: DisposeBag,
}

impl Default for ObserverState {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverState {
    /// Fresh identity, empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObserverId::next(),
            bag: DisposeBag::new(),
        }
    }

    /// This observer's identity.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Mutable access to the bag.
    pub fn bag_mut(&mut self) -> &mut DisposeBag {
        &mut self.bag
    }

    /// Number of tokens currently held.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.bag.len()
    }
}

impl Observer for ObserverState {
    fn observer_id(&self) -> ObserverId {
        self.id
    }

    fn dispose_bag_mut(&mut self) -> &mut DisposeBag {
        &mut self.bag
    }
}
