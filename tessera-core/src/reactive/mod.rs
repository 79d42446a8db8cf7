//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, derived signals
//! and the match combinator. These primitives feed every live binding the
//! template renderer creates.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state with an ordered list of
//! subscribers. Setting a new value notifies every subscriber synchronously.
//! Scalars that compare equal are not re-announced; objects always are.
//!
//! ## Derived Signals
//!
//! A derived signal is computed by a deriver function from other signals. The
//! deriver declares its dependencies explicitly by passing them through a
//! [`Tracker`]. Derived signals are lazy: they only subscribe upstream while
//! something downstream is subscribed to them.
//!
//! ## Match
//!
//! [`create_match`] dispatches a value or a signal over equality, type-tag and
//! exact-type cases. Over a signal the result is itself a lazy signal.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded and built from `Rc` handles. There is
//! no global scheduler: notification happens inside `set`, and a subscriber
//! that writes another signal runs that signal's subscribers before `set`
//! returns.

mod derive;
mod matching;
mod signal;
mod subscriber;

pub use derive::{create_or_get_derive_of_function, derive, DeriveFn, Tracker};
pub use matching::{create_match, Match, MatchSignal, Matchable, Switch, TypeTag};
pub use signal::{ReadSignal, Setter, Signal, SignalValue};
pub use subscriber::{SubscribeMode, SubscriberId, Subscription};
