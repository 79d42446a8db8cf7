//! Signal Implementation
//!
//! A signal holds a value and an ordered list of subscriber callbacks.
//!
//! # How Signals Work
//!
//! 1. `ReadSignal<T>` is the readable half: `get`, `with` and `subscribe`.
//!
//! 2. `Signal<T>` is the writable half. `set` notifies subscribers unless the
//!    new value is the same as the old one (see [`SignalValue`]); `change`
//!    mutates the value in place and always notifies.
//!
//! 3. Notification is synchronous and happens in subscription order, before
//!    `set` returns. A subscriber that sets another signal recurses straight
//!    into that signal's notification; nothing is batched or queued.
//!
//! # Lazy Signals
//!
//! A readable may be created with a start function. The start function runs
//! when the first subscriber arrives and returns a teardown [`Subscription`]
//! that is cancelled when the last subscriber leaves. Derived signals and
//! signal-mode matches are built this way.
//!
//! # Threading
//!
//! Signals are single-threaded `Rc` handles. Clones share state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::subscriber::{SubscribeMode, SubscriberId, Subscription};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Change detection for values stored in signals.
///
/// Scalars compare by equality, so setting the same number twice is a no-op.
/// Anything that behaves like an object keeps the default implementation and
/// always notifies: in-place mutation is a supported pattern, so reference
/// identity says nothing about whether the contents changed.
pub trait SignalValue: Clone + 'static {
    /// Whether replacing `self` with `next` is unobservable.
    fn is_same(&self, next: &Self) -> bool {
        let _ = next;
        false
    }
}

macro_rules! impl_signal_value_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SignalValue for $ty {
                fn is_same(&self, next: &Self) -> bool {
                    self == next
                }
            }
        )*
    };
}

impl_signal_value_by_eq!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

/// `None` plays the part of `null`, which is an object as far as change
/// detection is concerned.
impl<T: SignalValue> SignalValue for Option<T> {
    fn is_same(&self, next: &Self) -> bool {
        match (self, next) {
            (Some(current), Some(next)) => current.is_same(next),
            _ => false,
        }
    }
}

impl<T: 'static> SignalValue for Rc<T> {}

impl<T: Clone + 'static> SignalValue for Vec<T> {}

type Callback<T> = Box<dyn Fn(&T)>;
type Start<T> = Box<dyn Fn(Setter<T>) -> Subscription>;

/// One registered callback.
struct Entry<T> {
    id: SubscriberId,
    active: Cell<bool>,
    /// Version of the value this subscriber has already been shown.
    seen: Cell<u64>,
    callback: Callback<T>,
}

struct SignalInner<T> {
    id: u64,
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: RefCell<Vec<Rc<Entry<T>>>>,
    start: Option<Start<T>>,
    started: Cell<bool>,
    teardown: RefCell<Option<Subscription>>,
}

impl<T: SignalValue> SignalInner<T> {
    fn new(value: T, start: Option<Start<T>>) -> Self {
        Self {
            id: next_signal_id(),
            value: RefCell::new(value),
            version: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
            start,
            started: Cell::new(false),
            teardown: RefCell::new(None),
        }
    }

    /// Store `value` and notify, unless it is the same as the current value.
    fn replace(&self, value: T) {
        let same = self.value.borrow().is_same(&value);
        if same {
            return;
        }
        *self.value.borrow_mut() = value;
        self.notify();
    }

    /// Deliver the current value to every subscriber that has not seen it.
    fn notify(&self) {
        self.version.set(self.version.get() + 1);

        // Snapshot the list: callbacks may subscribe or unsubscribe.
        let entries = self.subscribers.borrow().clone();
        for entry in entries {
            let version = self.version.get();
            // A nested `set` from an earlier callback may already have shown
            // this subscriber a newer value.
            if !entry.active.get() || entry.seen.get() >= version {
                continue;
            }
            entry.seen.set(version);
            let value = self.value.borrow().clone();
            (entry.callback)(&value);
        }
    }

    fn remove(&self, id: SubscriberId) {
        let now_empty = {
            let mut subscribers = self.subscribers.borrow_mut();
            if let Some(position) = subscribers.iter().position(|entry| entry.id == id) {
                subscribers[position].active.set(false);
                subscribers.remove(position);
            }
            subscribers.is_empty()
        };

        if now_empty && self.started.get() {
            self.started.set(false);
            let teardown = self.teardown.borrow_mut().take();
            if let Some(teardown) = teardown {
                tracing::trace!(signal = self.id, "stopping lazy signal");
                teardown.unsubscribe();
            }
        }
    }
}

/// The readable half of a signal.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let readable: ReadSignal<i32> = count.read_only();
///
/// let subscription = readable.subscribe(|value| println!("{value}"), SubscribeMode::Immediate);
/// count.set(1);
/// subscription.unsubscribe();
/// ```
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: SignalValue> ReadSignal<T> {
    /// A readable that never changes on its own.
    pub fn constant(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner::new(value, None)),
        }
    }

    /// A readable whose producer is started by its first subscriber.
    ///
    /// `start` receives a [`Setter`] and returns the teardown handle, which
    /// is cancelled once the last subscriber is gone. The signal holds
    /// `initial` until the producer sets something else.
    pub fn lazy<F>(initial: T, start: F) -> Self
    where
        F: Fn(Setter<T>) -> Subscription + 'static,
    {
        Self {
            inner: Rc::new(SignalInner::new(initial, Some(Box::new(start)))),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value.
    ///
    /// The signal must not be written from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Register a callback for future changes.
    ///
    /// With [`SubscribeMode::Immediate`] the callback also runs once with the
    /// current value before this returns. The first subscriber of a lazy
    /// signal starts its producer.
    pub fn subscribe<F>(&self, callback: F, mode: SubscribeMode) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let first = self.inner.subscribers.borrow().is_empty();
        if first && !self.inner.started.get() {
            self.start();
        }

        let id = SubscriberId::new();
        let entry = Rc::new(Entry {
            id,
            active: Cell::new(true),
            seen: Cell::new(self.inner.version.get()),
            callback: Box::new(callback),
        });
        self.inner.subscribers.borrow_mut().push(Rc::clone(&entry));

        if mode == SubscribeMode::Immediate {
            let value = self.get();
            (entry.callback)(&value);
        }

        let inner = Rc::clone(&self.inner);
        Subscription::new(id, move || inner.remove(id))
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether a lazy producer is currently running.
    pub fn is_started(&self) -> bool {
        self.inner.started.get()
    }

    /// Whether both handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn start(&self) {
        let Some(start) = self.inner.start.as_ref() else {
            return;
        };
        tracing::trace!(signal = self.inner.id, "starting lazy signal");
        // Mark first: the producer may subscribe back into this signal.
        self.inner.started.set(true);
        let setter = Setter {
            inner: Rc::downgrade(&self.inner),
        };
        let teardown = start(setter);
        *self.inner.teardown.borrow_mut() = Some(teardown);
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: SignalValue + fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Write access handed to a lazy signal's producer.
///
/// Holds the signal weakly; once the signal is gone, setting is a no-op.
pub struct Setter<T> {
    inner: Weak<SignalInner<T>>,
}

impl<T: SignalValue> Setter<T> {
    /// Set the value with the same change detection as [`Signal::set`].
    pub fn set(&self, value: T) {
        if let Some(inner) = self.inner.upgrade() {
            inner.replace(value);
        }
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

/// A writable signal holding a value of type `T`.
///
/// Derefs to [`ReadSignal`], so every read operation is available directly.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
pub struct Signal<T> {
    read: ReadSignal<T>,
}

impl<T: SignalValue> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            read: ReadSignal::constant(value),
        }
    }

    /// Set a new value and notify subscribers.
    ///
    /// Does nothing when [`SignalValue::is_same`] says the value is unchanged.
    pub fn set(&self, value: T) {
        self.read.inner.replace(value);
    }

    /// Mutate the value in place and notify unconditionally.
    pub fn change<F>(&self, changer: F)
    where
        F: FnOnce(&mut T),
    {
        changer(&mut self.read.inner.value.borrow_mut());
        self.read.inner.notify();
    }

    /// Compute a new value from the current one and `set` it.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.read.inner.value.borrow());
        self.set(next);
    }

    /// Hand out the readable half.
    pub fn read_only(&self) -> ReadSignal<T> {
        self.read.clone()
    }
}

impl<T> Deref for Signal<T> {
    type Target = ReadSignal<T>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
        }
    }
}

impl<T: SignalValue + fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.read.inner.id)
            .field("value", &*self.read.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &T| sink.borrow_mut().push(value.clone()))
    }

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_notifies_subscribers() {
        let signal = Signal::new(0);
        let (seen, record) = recorder();
        let _subscription = signal.subscribe(record, SubscribeMode::Normal);

        assert!(seen.borrow().is_empty());

        signal.set(1);
        signal.set(2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn setting_identical_scalar_is_noop() {
        let signal = Signal::new(String::from("a"));
        let (seen, record) = recorder();
        let _subscription = signal.subscribe(record, SubscribeMode::Normal);

        signal.set(String::from("a"));
        assert!(seen.borrow().is_empty());

        signal.set(String::from("b"));
        assert_eq!(*seen.borrow(), vec![String::from("b")]);
    }

    #[test]
    fn objects_always_notify() {
        let shared = Rc::new(5);
        let signal = Signal::new(Rc::clone(&shared));
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let _subscription = signal.subscribe(
            move |_| counter.set(counter.get() + 1),
            SubscribeMode::Normal,
        );

        signal.set(Rc::clone(&shared));
        signal.set(shared);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn change_mutates_in_place_and_notifies() {
        let signal = Signal::new(vec![1, 2]);
        let (seen, record) = recorder();
        let _subscription = signal.subscribe(record, SubscribeMode::Normal);

        signal.change(|items| items.push(3));
        assert_eq!(signal.get(), vec![1, 2, 3]);
        assert_eq!(*seen.borrow(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn immediate_mode_delivers_current_value_first() {
        let signal = Signal::new(7);
        let (seen, record) = recorder();
        let _subscription = signal.subscribe(record, SubscribeMode::Immediate);

        assert_eq!(*seen.borrow(), vec![7]);
        signal.set(8);
        assert_eq!(*seen.borrow(), vec![7, 8]);
    }

    #[test]
    fn signal_unsubscribe() {
        let signal = Signal::new(0);
        let (seen, record) = recorder();
        let subscription = signal.subscribe(record, SubscribeMode::Normal);

        signal.set(1);
        subscription.unsubscribe();
        signal.set(2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let signal = Signal::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let subscriptions = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let order = order.clone();
                signal.subscribe(move |_| order.borrow_mut().push(name), SubscribeMode::Normal)
            })
            .collect::<Vec<_>>();

        signal.set(1);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        assert_eq!(subscriptions.len(), 3);
    }

    #[test]
    fn reentrant_set_is_not_delivered_twice() {
        let signal = Signal::new(0);
        let writer = signal.clone();
        let _clamp = signal.subscribe(
            move |value| {
                if *value > 10 {
                    writer.set(10);
                }
            },
            SubscribeMode::Normal,
        );
        let (seen, record) = recorder();
        let _observer = signal.subscribe(record, SubscribeMode::Normal);

        signal.set(50);

        // The observer saw the clamped value once and never the stale one.
        assert_eq!(*seen.borrow(), vec![10]);
        assert_eq!(signal.get(), 10);
    }

    #[test]
    fn lazy_signal_starts_and_stops_with_subscribers() {
        let starts = Rc::new(Cell::new(0));
        let stops = Rc::new(Cell::new(0));
        let (starts_in, stops_in) = (starts.clone(), stops.clone());

        let lazy = ReadSignal::lazy(0, move |setter| {
            starts_in.set(starts_in.get() + 1);
            setter.set(99);
            let stops = stops_in.clone();
            Subscription::new(SubscriberId::new(), move || stops.set(stops.get() + 1))
        });

        assert_eq!(lazy.get(), 0);
        assert!(!lazy.is_started());

        let (seen, record) = recorder();
        let first = lazy.subscribe(record, SubscribeMode::Immediate);
        let second = lazy.subscribe(|_| {}, SubscribeMode::Normal);

        assert_eq!(starts.get(), 1);
        assert_eq!(*seen.borrow(), vec![99]);

        first.unsubscribe();
        assert_eq!(stops.get(), 0);
        second.unsubscribe();
        assert_eq!(stops.get(), 1);
        assert!(!lazy.is_started());
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert!(signal1.ptr_eq(&signal2));
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        let s3 = ReadSignal::constant(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }
}
