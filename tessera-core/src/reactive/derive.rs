//! Derived Signals
//!
//! A derived signal is a read-only signal computed by a deriver function.
//! The deriver receives a [`Tracker`]; every signal it passes through
//! [`Tracker::track`] becomes a dependency.
//!
//! # How Derive Works
//!
//! 1. On construction the deriver runs once with a pass-through tracker to
//!    produce the initial value. Nothing is subscribed yet.
//!
//! 2. When the derived signal gets its first subscriber, it re-subscribes to
//!    every dependency found so far and re-runs the deriver with a real
//!    tracker. Signals read for the first time are subscribed on the spot.
//!
//! 3. Any dependency change re-runs the deriver and sets the result.
//!
//! 4. When the last subscriber leaves, every dependency subscription is
//!    cancelled through one aggregate handle.
//!
//! Dependencies are discovered by execution, so a signal that is only read
//! behind a condition is picked up the first time the condition holds. The
//! set only grows: a dependency that stops being read stays subscribed.
//! Each dependency has exactly one subscription from the node at a time.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::signal::{ReadSignal, Setter, SignalValue};
use super::subscriber::{SubscribeMode, SubscriberId, Subscription};

/// The dependency adder handed to derivers.
pub struct Tracker {
    mode: TrackerMode,
}

enum TrackerMode {
    /// Initial evaluation: reads are not recorded.
    Passthrough,
    /// Live evaluation: reads subscribe `refresh` to the signal.
    Tracking {
        dependencies: Rc<Dependencies>,
        refresh: Rc<dyn Refresh>,
    },
}

impl Tracker {
    fn passthrough() -> Self {
        Self {
            mode: TrackerMode::Passthrough,
        }
    }

    /// Record `signal` as a dependency and return it unchanged.
    pub fn track<'a, U: SignalValue>(&self, signal: &'a ReadSignal<U>) -> &'a ReadSignal<U> {
        let TrackerMode::Tracking {
            dependencies,
            refresh,
        } = &self.mode
        else {
            return signal;
        };

        let id = signal.id();
        if dependencies.tracked.borrow().contains_key(&id) {
            return signal;
        }

        // Record before subscribing so a re-entrant run sees it as tracked.
        let dependency: Rc<dyn Dependency> = Rc::new(signal.clone());
        dependencies
            .tracked
            .borrow_mut()
            .insert(id, Rc::clone(&dependency));
        let subscription = dependency.subscribe_refresh(Rc::clone(refresh));
        dependencies.subscriptions.borrow_mut().push(subscription);
        signal
    }

    /// Track `signal` and read its current value.
    pub fn get<U: SignalValue>(&self, signal: &ReadSignal<U>) -> U {
        self.track(signal).get()
    }

    /// Whether reads are currently being recorded.
    pub fn is_tracking(&self) -> bool {
        matches!(self.mode, TrackerMode::Tracking { .. })
    }
}

/// A type-erased upstream signal.
trait Dependency {
    fn subscribe_refresh(&self, refresh: Rc<dyn Refresh>) -> Subscription;
}

impl<U: SignalValue> Dependency for ReadSignal<U> {
    fn subscribe_refresh(&self, refresh: Rc<dyn Refresh>) -> Subscription {
        self.subscribe(move |_| refresh.refresh(), SubscribeMode::Normal)
    }
}

/// Something that re-runs when a dependency changes.
trait Refresh {
    fn refresh(&self);
}

/// Dependency bookkeeping that outlives individual activations.
#[derive(Default)]
struct Dependencies {
    tracked: RefCell<IndexMap<u64, Rc<dyn Dependency>>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Dependencies {
    fn release(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        Subscription::all(subscriptions).unsubscribe();
    }
}

/// One period during which the derived signal has subscribers.
struct Activation<T> {
    deriver: Rc<dyn Fn(&Tracker) -> T>,
    setter: Setter<T>,
    dependencies: Rc<Dependencies>,
    this: Weak<Activation<T>>,
}

impl<T: SignalValue> Refresh for Activation<T> {
    fn refresh(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let tracker = Tracker {
            mode: TrackerMode::Tracking {
                dependencies: Rc::clone(&self.dependencies),
                refresh: this,
            },
        };
        let value = (self.deriver)(&tracker);
        self.setter.set(value);
    }
}

/// Create a derived signal.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(2);
/// let doubled = derive({
///     let count = count.clone();
///     move |t| t.get(&count) * 2
/// });
/// ```
pub fn derive<T, F>(deriver: F) -> ReadSignal<T>
where
    T: SignalValue,
    F: Fn(&Tracker) -> T + 'static,
{
    derive_shared(Rc::new(deriver))
}

fn derive_shared<T: SignalValue>(deriver: Rc<dyn Fn(&Tracker) -> T>) -> ReadSignal<T> {
    let initial = deriver(&Tracker::passthrough());
    let dependencies = Rc::new(Dependencies::default());

    ReadSignal::lazy(initial, move |setter| {
        tracing::trace!(
            dependencies = dependencies.tracked.borrow().len(),
            "activating derived signal"
        );
        let activation = Rc::new_cyclic(|this| Activation {
            deriver: Rc::clone(&deriver),
            setter,
            dependencies: Rc::clone(&dependencies),
            this: Weak::clone(this),
        });

        let known = dependencies
            .tracked
            .borrow()
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for dependency in known {
            let refresh: Rc<dyn Refresh> = activation.clone();
            let subscription = dependency.subscribe_refresh(refresh);
            dependencies.subscriptions.borrow_mut().push(subscription);
        }
        activation.refresh();

        let dependencies = Rc::clone(&dependencies);
        Subscription::new(SubscriberId::new(), move || {
            tracing::trace!("tearing down derived signal");
            dependencies.release();
        })
    })
}

/// A deriver function with identity.
///
/// Clones share identity, so they map to the same derived signal. The signal
/// is created on first use and stored with the function, so it lives exactly
/// as long as the function value does.
pub struct DeriveFn<T> {
    inner: Rc<DeriveFnInner<T>>,
}

struct DeriveFnInner<T> {
    function: Rc<dyn Fn(&Tracker) -> T>,
    /// Holds `function` but never this allocation, so there is no cycle.
    signal: OnceCell<ReadSignal<T>>,
}

impl<T: SignalValue> DeriveFn<T> {
    /// Wrap a deriver.
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&Tracker) -> T + 'static,
    {
        Self {
            inner: Rc::new(DeriveFnInner {
                function: Rc::new(function),
                signal: OnceCell::new(),
            }),
        }
    }

    /// Evaluate once without tracking anything.
    pub fn call_untracked(&self) -> T {
        (self.inner.function)(&Tracker::passthrough())
    }

    /// Whether both handles are the same function value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether a derived signal has been created for this function.
    pub fn has_signal(&self) -> bool {
        self.inner.signal.get().is_some()
    }
}

impl<T> Clone for DeriveFn<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for DeriveFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveFn")
            .field("function", &Rc::as_ptr(&self.inner))
            .field("has_signal", &self.inner.signal.get().is_some())
            .finish()
    }
}

/// Same as [`derive`], memoized on the identity of `function`.
///
/// Passing the same `DeriveFn` (or a clone of it) again returns the same
/// signal for as long as the function value is alive, whether or not the
/// caller kept the first result. A structurally identical but separately
/// created function gets its own signal.
pub fn create_or_get_derive_of_function<T: SignalValue>(function: &DeriveFn<T>) -> ReadSignal<T> {
    function
        .inner
        .signal
        .get_or_init(|| {
            tracing::trace!("deriving signal for function");
            derive_shared(Rc::clone(&function.inner.function))
        })
        .clone()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
