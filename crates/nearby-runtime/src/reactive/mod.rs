#![forbid(unsafe_code)]

//! Observable values and lifetime-bound subscriptions.
//!
//! This module provides the change-propagation primitives the rest of the
//! runtime is built on:
//!
//! - [`Observable`]: A shared value that notifies identity-keyed handlers
//!   with `(new, old)` on every write.
//! - [`CoalescingObservable`]: Same, but writes of an equal value notify
//!   nobody.
//! - [`Disposable`]: RAII token that removes one registration on dispose or
//!   drop.
//! - [`DisposeBag`]: Owns tokens; dropping or replacing it releases them all.
//! - [`Observer`]: Capability trait for anything that owns a bag, with
//!   `observe` and `remove_all_observations` helpers.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Handlers are owned strongly by the observable and keyed by
//! [`ObserverId`]; tokens hold only a `Weak` handle back, so neither side
//! keeps the other alive.
//!
//! ```text
//!  producer ──set()──▶ Observable ──(new, old)──▶ handler[id]
//!                         ▲
//!                         │ Weak
//!  observer ─owns─▶ DisposeBag ─owns─▶ Disposable
//! ```
//!
//! # Invariants
//!
//! 1. At most one handler per observer identity; the last registration wins.
//! 2. Every write notifies every handler registered at that moment exactly
//!    once, synchronously (coalescing observables skip equal writes).
//! 3. Cross-observer notification order is unspecified.
//! 4. Once a token is disposed its handler is never invoked again.

pub mod dispose;
pub mod observable;
pub mod observer;

pub use dispose::{DisposeBag, Disposable};
pub use observable::{
    ChangeHandler, CoalescingObservable, Observable, ObservableOptions, WeakObservable,
};
pub use observer::{Observer, ObserverId, ObserverState};
