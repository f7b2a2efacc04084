#![forbid(unsafe_code)]

//! Observable value wrapper with identity-keyed change handlers.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Handlers are stored strongly, keyed by the
//! [`ObserverId`] of the entity that registered them. The observable never
//! holds a reference back to its observers: the [`Disposable`] returned from
//! [`add_observer`](Observable::add_observer) is the only thing that removes
//! a registration, and it only holds a `Weak` handle to the observable.
//!
//! [`CoalescingObservable<T>`] shares the same storage but carries an
//! equality policy, so writes that do not change the value notify nobody.
//!
//! # Performance
//!
//! | Operation        | Complexity                  |
//! |------------------|-----------------------------|
//! | `get()`          | O(1) + clone                |
//! | `set()`          | O(H) where H = handlers     |
//! | `add_observer()` | O(1) amortized              |
//! | `remove_observer()` | O(1) amortized           |
//!
//! # Re-entrancy
//!
//! Change handlers run with no borrow held, so they may read the value, add
//! or remove observers, or dispose tokens. A handler that is removed while a
//! round is in progress is skipped for the rest of that round.
//!
//! A `set()` issued from inside a handler stores the value immediately and
//! queues its notification. Queued notifications are delivered in FIFO order
//! once the current round finishes, before the outermost `set()` returns.
//! Each one reaches only the handlers that were registered when its write
//! happened.
//!
//! The closure passed to [`Observable::with`] is different: it runs while the
//! value is borrowed, and writing to the same observable from it panics.
//!
//! # Failure Modes
//!
//! - **Handler panic**: the panic propagates out of `set()`. The value stays
//!   written; queued notifications for that cycle are discarded so the
//!   observable is usable afterwards.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::dispose::Disposable;
use super::observer::ObserverId;

bitflags::bitflags! {
    /// Registration options for [`Observable::add_observer`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObservableOptions: u8 {
        /// Invoke the handler with `(current, None)` before `add_observer`
        /// returns.
        const INITIAL = 1 << 0;
    }
}

impl Default for ObservableOptions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Change handler signature: `(new, old)`.
///
/// `old` is `None` only for the callback triggered by
/// [`ObservableOptions::INITIAL`].
pub type ChangeHandler<T> = dyn Fn(&T, Option<&T>);

type HandlerRc<T> = Rc<ChangeHandler<T>>;
type EqualityFn<T> = fn(&T, &T) -> bool;

struct Registration<T> {
    /// Distinguishes successive registrations under the same identity.
    generation: u64,
    handler: HandlerRc<T>,
}

/// Shared interior for [`Observable<T>`].
struct ObservableInner<T> {
    value: T,
    version: u64,
    observers: HashMap<ObserverId, Registration<T>>,
    next_generation: u64,
    /// Present only for coalescing observables.
    equal: Option<EqualityFn<T>>,
    /// True while a notification round is being delivered.
    notifying: bool,
    /// Re-entrant writes, delivered after the current round.
    pending: VecDeque<PendingWrite<T>>,
}

/// A write made while a round was in progress.
struct PendingWrite<T> {
    new: T,
    old: T,
    /// Registrations with a generation at or above this were added after
    /// the write and do not hear about it.
    cutoff: u64,
}

/// A shared mutable value that notifies registered handlers on every write.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state;
/// both handles see the same value and share observers. The state is dropped
/// when the last handle goes away; outstanding [`Disposable`]s become inert.
///
/// # Invariants
///
/// 1. There is exactly one current value at all times.
/// 2. At most one handler per [`ObserverId`]; re-registering replaces it.
/// 3. Every handler registered when a write happens is invoked exactly once
///    for that write, unless it is removed before its turn.
/// 4. Notification is synchronous: it completes before `set()` returns.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("observer_count", &inner.observers.len())
            .field("coalescing", &inner.equal.is_some())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner.borrow().value, f)
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no observers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_equality(value, None)
    }

    fn with_equality(value: T, equal: Option<EqualityFn<T>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                observers: HashMap::new(),
                next_generation: 0,
                equal,
                notifying: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// The value stays borrowed while `f` runs. Calling `set`, `update`,
    /// `add_observer`, or `remove_observer` on this observable from inside
    /// `f`, or dropping one of its [`Disposable`]s there, panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the current value and notify every registered handler with
    /// `(new, Some(old))`.
    ///
    /// On a coalescing observable, a value equal to the current one is
    /// stored but nobody is notified and the version does not change.
    pub fn set(&self, value: T) {
        let write = {
            let mut inner = self.inner.borrow_mut();
            let old = std::mem::replace(&mut inner.value, value);
            if let Some(equal) = inner.equal
                && equal(&old, &inner.value)
            {
                // `old` is dropped after the borrow is released.
                drop(inner);
                return;
            }
            inner.version += 1;
            let write = PendingWrite {
                new: inner.value.clone(),
                old,
                cutoff: inner.next_generation,
            };
            if inner.notifying {
                debug!(
                    version = inner.version,
                    queued = inner.pending.len() + 1,
                    "re-entrant set queued behind current notification"
                );
                inner.pending.push_back(write);
                return;
            }
            inner.notifying = true;
            write
        };
        self.deliver(write);
    }

    /// Modify the value in place via a closure, then notify as [`set`] does.
    ///
    /// [`set`]: Observable::set
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Register `handler` under `id`, replacing any handler `id` already has.
    ///
    /// With [`ObservableOptions::INITIAL`] the handler is invoked once with
    /// `(current, None)` before this returns.
    ///
    /// The returned [`Disposable`] removes this particular registration when
    /// disposed or dropped. It is a no-op if the registration was already
    /// removed or replaced, or if the observable no longer exists.
    #[must_use = "dropping the Disposable immediately removes the registration"]
    pub fn add_observer(
        &self,
        id: ObserverId,
        options: ObservableOptions,
        handler: impl Fn(&T, Option<&T>) + 'static,
    ) -> Disposable {
        let handler: HandlerRc<T> = Rc::new(handler);
        let (generation, previous) = {
            let mut inner = self.inner.borrow_mut();
            let generation = inner.next_generation;
            inner.next_generation += 1;
            let previous = inner.observers.insert(
                id,
                Registration {
                    generation,
                    handler: Rc::clone(&handler),
                },
            );
            (generation, previous)
        };
        // Dropped outside the borrow: the old handler may own tokens.
        if previous.is_some() {
            debug!(observer = %id, "replaced existing change handler");
        }
        drop(previous);

        if options.contains(ObservableOptions::INITIAL) {
            let current = self.get();
            handler(&current, None);
        }

        let weak = Rc::downgrade(&self.inner);
        Disposable::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let removed = {
                let mut inner = inner.borrow_mut();
                let current = inner
                    .observers
                    .get(&id)
                    .is_some_and(|reg| reg.generation == generation);
                if current {
                    inner.observers.remove(&id)
                } else {
                    None
                }
            };
            drop(removed);
        })
    }

    /// Remove the handler registered under `id`, if any. Idempotent.
    pub fn remove_observer(&self, id: ObserverId) {
        let removed = self.inner.borrow_mut().observers.remove(&id);
        drop(removed);
    }

    /// Whether a handler is currently registered under `id`.
    #[must_use]
    pub fn is_observed_by(&self, id: ObserverId) -> bool {
        self.inner.borrow().observers.contains_key(&id)
    }

    /// Number of currently registered handlers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Current version number. Increments by 1 on each write that notifies.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Whether writes of an equal value are suppressed.
    #[must_use]
    pub fn is_coalescing(&self) -> bool {
        self.inner.borrow().equal.is_some()
    }

    /// Create a non-owning handle to this observable.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver `write` and then drain anything queued by handlers.
    fn deliver(&self, write: PendingWrite<T>) {
        let _guard = NotifyGuard { inner: &*self.inner };
        let mut next = Some(write);
        while let Some(write) = next {
            self.notify_round(&write);
            next = self.inner.borrow_mut().pending.pop_front();
        }
    }

    /// Invoke every handler that was registered when `write` happened.
    fn notify_round(&self, write: &PendingWrite<T>) {
        // Snapshot first so no borrow is held during calls.
        let snapshot: Vec<(ObserverId, u64, HandlerRc<T>)> = {
            let inner = self.inner.borrow();
            trace!(
                version = inner.version,
                observers = inner.observers.len(),
                "notifying observers"
            );
            inner
                .observers
                .iter()
                .filter(|(_, reg)| reg.generation < write.cutoff)
                .map(|(id, reg)| (*id, reg.generation, Rc::clone(&reg.handler)))
                .collect()
        };

        for (id, generation, handler) in snapshot {
            let still_registered = self
                .inner
                .borrow()
                .observers
                .get(&id)
                .is_some_and(|reg| reg.generation == generation);
            if still_registered {
                handler(&write.new, Some(&write.old));
            }
        }
    }
}

/// Clears the notifying flag even if a handler panics.
struct NotifyGuard<'a, T> {
    inner: &'a RefCell<ObservableInner<T>>,
}

impl<T> Drop for NotifyGuard<'_, T> {
    fn drop(&mut self) {
        let discarded = match self.inner.try_borrow_mut() {
            Ok(mut inner) => {
                inner.notifying = false;
                std::mem::take(&mut inner.pending)
            }
            Err(_) => return,
        };
        drop(discarded);
    }
}

/// A non-owning handle to an [`Observable`].
///
/// Useful inside handlers that need to reach their own observable (for
/// example to unregister themselves) without keeping it alive.
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakObservable<T> {
    /// Upgrade to a full handle if the observable still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

/// An [`Observable`] that skips notification when the new value equals the
/// current one.
///
/// The equality policy lives in the shared state, so it also applies to
/// writes made through the plain [`Observable`] view obtained via `Deref`,
/// [`as_observable`](Self::as_observable) or
/// [`into_observable`](Self::into_observable).
pub struct CoalescingObservable<T> {
    observable: Observable<T>,
}

impl<T> Clone for CoalescingObservable<T> {
    fn clone(&self) -> Self {
        Self {
            observable: self.observable.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CoalescingObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CoalescingObservable")
            .field(&self.observable)
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for CoalescingObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.observable, f)
    }
}

impl<T: Clone + PartialEq + 'static> CoalescingObservable<T> {
    /// Create a new coalescing observable with the given initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        let equal: EqualityFn<T> = <T as PartialEq>::eq;
        Self {
            observable: Observable::with_equality(value, Some(equal)),
        }
    }
}

impl<T> CoalescingObservable<T> {
    /// Borrow the underlying observable handle.
    #[must_use]
    pub fn as_observable(&self) -> &Observable<T> {
        &self.observable
    }

    /// Convert into the underlying observable handle. Coalescing is kept.
    #[must_use]
    pub fn into_observable(self) -> Observable<T> {
        self.observable
    }
}

impl<T> Deref for CoalescingObservable<T> {
    type Target = Observable<T>;

    fn deref(&self) -> &Self::Target {
        &self.observable
    }
}

impl<T> From<CoalescingObservable<T>> for Observable<T> {
    fn from(value: CoalescingObservable<T>) -> Self {
        value.observable
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Log<T> = Rc<RefCell<Vec<(T, Option<T>)>>>;

    fn recorder<T: Clone + 'static>(log: &Log<T>) -> impl Fn(&T, Option<&T>) + 'static {
        let log = Rc::clone(log);
        move |new, old| log.borrow_mut().push((new.clone(), old.cloned()))
    }

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn plain_observable_notifies_on_equal_value() {
        let obs = Observable::new(0);
        let log: Log<i32> = Rc::default();
        let id = ObserverId::next();
        let _token = obs.add_observer(id, ObservableOptions::INITIAL, recorder(&log));

        obs.set(5);
        obs.set(5);

        assert_eq!(*log.borrow(), vec![(0, None), (5, Some(0)), (5, Some(5))]);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn coalescing_skips_equal_value() {
        let obs = CoalescingObservable::new(0);
        let log: Log<i32> = Rc::default();
        let _token = obs.add_observer(ObserverId::next(), ObservableOptions::INITIAL, recorder(&log));

        obs.set(5);
        obs.set(5);

        assert_eq!(*log.borrow(), vec![(0, None), (5, Some(0))]);
        assert_eq!(obs.version(), 1);
        assert!(obs.is_coalescing());
    }

    #[test]
    fn coalescing_survives_conversion() {
        let obs: Observable<i32> = CoalescingObservable::new(1).into();
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let _token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |_, _| {
            c.set(c.get() + 1);
        });

        obs.set(1);
        assert_eq!(count.get(), 0);
        obs.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn without_initial_no_immediate_call() {
        let obs = Observable::new("a".to_string());
        let log: Log<String> = Rc::default();
        let _token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&log));
        assert!(log.borrow().is_empty());

        obs.set("b".to_string());
        assert_eq!(
            *log.borrow(),
            vec![("b".to_string(), Some("a".to_string()))]
        );
    }

    #[test]
    fn reregistering_replaces_handler() {
        let obs = Observable::new(0);
        let first: Log<i32> = Rc::default();
        let second: Log<i32> = Rc::default();
        let id = ObserverId::next();

        let _t1 = obs.add_observer(id, ObservableOptions::empty(), recorder(&first));
        let _t2 = obs.add_observer(id, ObservableOptions::empty(), recorder(&second));
        assert_eq!(obs.observer_count(), 1);

        obs.set(1);
        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![(1, Some(0))]);
    }

    #[test]
    fn stale_token_does_not_remove_replacement() {
        let obs = Observable::new(0);
        let id = ObserverId::next();

        let mut stale = obs.add_observer(id, ObservableOptions::empty(), |_, _| {});
        let _fresh = obs.add_observer(id, ObservableOptions::empty(), |_, _| {});

        stale.dispose();
        assert!(obs.is_observed_by(id));
    }

    #[test]
    fn dispose_removes_exactly_one_registration() {
        let obs = Observable::new(0);
        let a: Log<i32> = Rc::default();
        let b: Log<i32> = Rc::default();

        let mut token_a = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&a));
        let _token_b = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&b));
        assert_eq!(obs.observer_count(), 2);

        token_a.dispose();
        assert_eq!(obs.observer_count(), 1);
        token_a.dispose();
        assert_eq!(obs.observer_count(), 1);

        obs.set(1);
        assert!(a.borrow().is_empty());
        assert_eq!(*b.borrow(), vec![(1, Some(0))]);
    }

    #[test]
    fn dropping_token_unregisters() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);

        let token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |_, _| {
            c.set(c.get() + 1);
        });
        obs.set(1);
        drop(token);
        obs.set(2);

        assert_eq!(count.get(), 1);
        assert_eq!(obs.observer_count(), 0);
    }

    #[test]
    fn remove_observer_is_idempotent() {
        let obs = Observable::new(0);
        let id = ObserverId::next();
        let _token = obs.add_observer(id, ObservableOptions::empty(), |_, _| {});

        obs.remove_observer(id);
        obs.remove_observer(id);
        obs.remove_observer(ObserverId::next());
        assert_eq!(obs.observer_count(), 0);
    }

    #[test]
    fn token_outliving_observable_is_inert() {
        let obs = Observable::new(0);
        let mut token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), |_, _| {});
        drop(obs);
        token.dispose();
        assert!(token.is_disposed());
    }

    #[test]
    fn clone_shares_state_and_observers() {
        let obs1 = Observable::new(0);
        let obs2 = obs1.clone();
        let log: Log<i32> = Rc::default();
        let _token = obs1.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&log));

        obs2.set(42);
        assert_eq!(obs1.get(), 42);
        assert_eq!(*log.borrow(), vec![(42, Some(0))]);
    }

    #[test]
    fn update_notifies_with_previous() {
        let obs = Observable::new(vec![1, 2, 3]);
        let log: Log<Vec<i32>> = Rc::default();
        let _token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&log));

        obs.update(|v| v.push(4));
        assert_eq!(*log.borrow(), vec![(vec![1, 2, 3, 4], Some(vec![1, 2, 3]))]);
    }

    #[test]
    fn with_access() {
        let obs = Observable::new(vec![1, 2, 3]);
        let sum = obs.with(|v| v.iter().sum::<i32>());
        assert_eq!(sum, 6);
    }

    #[test]
    fn handler_can_remove_itself() {
        let obs = Observable::new(0);
        let id = ObserverId::next();
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let weak = obs.downgrade();

        let _token = obs.add_observer(id, ObservableOptions::empty(), move |_, _| {
            c.set(c.get() + 1);
            if let Some(obs) = weak.upgrade() {
                obs.remove_observer(id);
            }
        });

        obs.set(1);
        obs.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_removed_mid_round_is_skipped() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let a = ObserverId::next();
        let b = ObserverId::next();

        // Each handler removes the other; whichever runs first wins.
        let weak = obs.downgrade();
        let c = Rc::clone(&count);
        let _ta = obs.add_observer(a, ObservableOptions::empty(), move |_, _| {
            c.set(c.get() + 1);
            if let Some(obs) = weak.upgrade() {
                obs.remove_observer(b);
            }
        });
        let weak = obs.downgrade();
        let c = Rc::clone(&count);
        let _tb = obs.add_observer(b, ObservableOptions::empty(), move |_, _| {
            c.set(c.get() + 1);
            if let Some(obs) = weak.upgrade() {
                obs.remove_observer(a);
            }
        });

        obs.set(1);
        assert_eq!(count.get(), 1);
        assert_eq!(obs.observer_count(), 1);
    }

    #[test]
    fn reentrant_set_is_queued_in_order() {
        let obs = Observable::new(0);
        let log: Log<i32> = Rc::default();
        let weak = obs.downgrade();

        // Bumps odd values to the next even value.
        let _bumper = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |new, _| {
            if new % 2 == 1
                && let Some(obs) = weak.upgrade()
            {
                obs.set(new + 1);
                // Value is visible immediately, notification is deferred.
                assert_eq!(obs.get(), new + 1);
            }
        });
        let _rec = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), recorder(&log));

        obs.set(1);

        assert_eq!(obs.get(), 2);
        assert_eq!(*log.borrow(), vec![(1, Some(0)), (2, Some(1))]);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn queued_write_skips_observers_added_after_it() {
        let obs = Observable::new(0);
        let late_log: Log<i32> = Rc::default();
        let weak = obs.downgrade();
        let log_for_handler = Rc::clone(&late_log);
        let late_token: Rc<RefCell<Option<Disposable>>> = Rc::default();
        let slot = Rc::clone(&late_token);

        let _writer = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |new, _| {
            if *new == 1
                && let Some(obs) = weak.upgrade()
            {
                obs.set(2);
                let token = obs.add_observer(
                    ObserverId::next(),
                    ObservableOptions::empty(),
                    recorder(&log_for_handler),
                );
                *slot.borrow_mut() = Some(token);
            }
        });

        obs.set(1);
        assert_eq!(obs.get(), 2);
        // The write to 2 happened before the late observer existed.
        assert!(late_log.borrow().is_empty());

        obs.set(3);
        assert_eq!(*late_log.borrow(), vec![(3, Some(2))]);
    }

    #[test]
    fn initial_comes_before_any_queued_write() {
        let obs = Observable::new(0);
        let late_log: Log<i32> = Rc::default();
        let weak = obs.downgrade();
        let log_for_handler = Rc::clone(&late_log);
        let late_token: Rc<RefCell<Option<Disposable>>> = Rc::default();
        let slot = Rc::clone(&late_token);

        let _writer = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |new, _| {
            if *new == 1
                && let Some(obs) = weak.upgrade()
            {
                obs.set(2);
                let token = obs.add_observer(
                    ObserverId::next(),
                    ObservableOptions::INITIAL,
                    recorder(&log_for_handler),
                );
                *slot.borrow_mut() = Some(token);
            }
        });

        obs.set(1);
        assert_eq!(*late_log.borrow(), vec![(2, None)]);
    }

    /// Compares by tag only; the slot can own a token for the observable
    /// that holds this value.
    #[derive(Clone)]
    struct Tagged(u8, Rc<RefCell<Option<Disposable>>>);

    impl PartialEq for Tagged {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    #[test]
    fn coalesced_old_value_dropped_after_borrow_released() {
        let slot: Rc<RefCell<Option<Disposable>>> = Rc::default();
        let obs = CoalescingObservable::new(Tagged(1, Rc::clone(&slot)));
        let token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), |_, _| {});
        *slot.borrow_mut() = Some(token);
        drop(slot);
        assert_eq!(obs.observer_count(), 1);

        // The replaced value owns the only token; dropping it unregisters.
        obs.set(Tagged(1, Rc::default()));
        assert_eq!(obs.observer_count(), 0);
        assert_eq!(obs.version(), 0);
    }

    #[test]
    #[should_panic]
    fn writing_inside_with_panics() {
        let obs = Observable::new(0);
        obs.with(|_| obs.set(1));
    }

    #[test]
    fn reads_inside_with_are_fine() {
        let obs = Observable::new(5);
        let doubled = obs.with(|v| v + obs.get());
        assert_eq!(doubled, 10);
    }

    #[test]
    fn handler_can_register_during_notification() {
        let obs = Observable::new(0);
        let log: Log<i32> = Rc::default();
        let late_id = ObserverId::next();
        let weak = obs.downgrade();
        let late_log = Rc::clone(&log);
        let late_token: Rc<RefCell<Option<Disposable>>> = Rc::default();
        let slot = Rc::clone(&late_token);

        let _token = obs.add_observer(ObserverId::next(), ObservableOptions::empty(), move |_, _| {
            if slot.borrow().is_none()
                && let Some(obs) = weak.upgrade()
            {
                let token = obs.add_observer(late_id, ObservableOptions::empty(), recorder(&late_log));
                *slot.borrow_mut() = Some(token);
            }
        });

        obs.set(1);
        // Not part of the snapshot for the first round.
        assert!(log.borrow().is_empty());
        obs.set(2);
        assert_eq!(*log.borrow(), vec![(2, Some(1))]);
    }

    #[test]
    fn panicking_handler_leaves_observable_usable() {
        let obs = Observable::new(0);
        let id = ObserverId::next();
        let _token = obs.add_observer(id, ObservableOptions::empty(), |new, _| {
            assert!(*new != 1, "boom");
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| obs.set(1)));
        assert!(result.is_err());
        assert_eq!(obs.get(), 1);

        obs.set(2);
        assert_eq!(obs.version(), 2);
    }

    #[test]
    fn display_shows_value() {
        let obs = Observable::new(7);
        assert_eq!(obs.to_string(), "7");
        let coalescing = CoalescingObservable::new("hi");
        assert_eq!(coalescing.to_string(), "hi");
    }

    #[test]
    fn debug_format() {
        let obs = Observable::new(42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("observer_count"));
    }

    #[test]
    fn options_default_is_empty() {
        assert_eq!(ObservableOptions::default(), ObservableOptions::empty());
        assert!(!ObservableOptions::default().contains(ObservableOptions::INITIAL));
    }

    #[test]
    fn weak_handle_dies_with_observable() {
        let obs = Observable::new(0);
        let weak = obs.downgrade();
        assert!(weak.upgrade().is_some());
        drop(obs);
        assert!(weak.upgrade().is_none());
    }
}
