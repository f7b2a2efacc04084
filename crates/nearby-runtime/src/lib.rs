#![forbid(unsafe_code)]

//! Runtime: observable values and the location-driven store list.
//!
//! # Role in the workspace
//! `nearby-runtime` owns the change-propagation layer. A producer
//! ([`location::LocationController`]) writes position fixes into an
//! [`Observable`](reactive::Observable); consumers
//! ([`store_list::StoreList`], [`store_list::StoreRow`]) implement
//! [`Observer`](reactive::Observer) and keep their subscriptions in a
//! [`DisposeBag`](reactive::DisposeBag), so cleanup follows their lifetime.
//!
//! # Threading
//! Everything here is single-threaded (`Rc`, `RefCell`). Asynchronous
//! collaborators must hand results back to the owning thread before writing
//! into an observable.

pub mod location;
pub mod reactive;
pub mod search;
pub mod store_list;

pub use location::{LocationConfig, LocationController};
pub use reactive::{
    CoalescingObservable, DisposeBag, Disposable, Observable, ObservableOptions, Observer,
    ObserverId, ObserverState,
};
pub use search::{PlaceSearch, Placemark, SearchError, SearchRegion, SearchRequest, StaticPlaceSearch};
pub use store_list::{StoreList, StoreRow};
