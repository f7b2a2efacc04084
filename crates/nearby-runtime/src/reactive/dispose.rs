#![forbid(unsafe_code)]

//! Lifetime-bound subscription tokens.
//!
//! A [`Disposable`] wraps a release action that runs at most once: either
//! when [`dispose`](Disposable::dispose) is called or when the token is
//! dropped, whichever comes first. A [`DisposeBag`] owns any number of
//! tokens and releases all of them when it is dropped or replaced.
//!
//! # Invariants
//!
//! 1. A release action runs exactly once if the token is ever disposed or
//!    dropped, and never more than once.
//! 2. Dropping a bag disposes every token it holds.

use std::fmt;

/// RAII guard for one registration.
///
/// Usually owned by the [`DisposeBag`] of the observer that created it, so
/// the registration lives exactly as long as the observer (or until the
/// observer clears its bag).
#[must_use = "dropping a Disposable runs its release action immediately"]
pub struct Disposable {
    release: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Disposable {
    /// Create a token that runs `release` when disposed or dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Run the release action. Subsequent calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the release action has already run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.release.is_none()
    }

    /// Move this token into `bag`, which now owns the registration.
    pub fn disposed_by(self, bag: &mut DisposeBag) {
        bag.insert(self);
    }
}

impl Drop for Disposable {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// An insertion-ordered collection of [`Disposable`]s, cleared as a unit.
///
/// There is no way to remove a single token; replace the bag (for example
/// with `std::mem::take`) to release everything it holds.
#[derive(Default)]
pub struct DisposeBag {
    disposables: Vec<Disposable>,
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag")
            .field("len", &self.disposables.len())
            .finish()
    }
}

impl DisposeBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `disposable`.
    pub fn insert(&mut self, disposable: Disposable) {
        self.disposables.push(disposable);
    }

    /// Number of tokens held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.disposables.len()
    }

    /// Whether the bag holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disposables.is_empty()
    }
}

impl Extend<Disposable> for DisposeBag {
    fn extend<I: IntoIterator<Item = Disposable>>(&mut self, iter: I) {
        self.disposables.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(count: &Rc<Cell<u32>>) -> Disposable {
        let count = Rc::clone(count);
        Disposable::new(move || count.set(count.get() + 1))
    }

    #[test]
    fn dispose_runs_once() {
        let count = Rc::new(Cell::new(0));
        let mut token = counting(&count);
        assert!(!token.is_disposed());

        token.dispose();
        token.dispose();
        assert!(token.is_disposed());
        drop(token);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_runs_release() {
        let count = Rc::new(Cell::new(0));
        {
            let _token = counting(&count);
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn bag_holds_until_dropped() {
        let count = Rc::new(Cell::new(0));
        let mut bag = DisposeBag::new();
        counting(&count).disposed_by(&mut bag);
        counting(&count).disposed_by(&mut bag);
        bag.insert(counting(&count));

        assert_eq!(bag.len(), 3);
        assert_eq!(count.get(), 0);

        drop(bag);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn replacing_bag_releases_previous() {
        let count = Rc::new(Cell::new(0));
        let mut bag = DisposeBag::new();
        bag.extend([counting(&count), counting(&count)]);

        bag = DisposeBag::new();
        assert_eq!(count.get(), 2);
        assert!(bag.is_empty());
    }

    #[test]
    fn pre_disposed_token_in_bag_releases_once() {
        let count = Rc::new(Cell::new(0));
        let mut token = counting(&count);
        token.dispose();

        let mut bag = DisposeBag::new();
        token.disposed_by(&mut bag);
        drop(bag);

        assert_eq!(count.get(), 1);
    }
}
