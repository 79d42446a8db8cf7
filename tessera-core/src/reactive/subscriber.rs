//! Subscriber types for the reactive system.
//!
//! A subscription represents one callback registered on one signal. It is
//! owned by whoever created it (a derive node, a mounted DOM node, a manual
//! caller) and must be cancelled once per logical teardown. Cancelling is
//! idempotent, so a second call is harmless.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each registration on a signal gets its own ID, which the signal uses to
/// find the entry again when the subscription is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// When a new subscriber first hears from its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscribeMode {
    /// Only future changes are delivered.
    #[default]
    Normal,

    /// The callback is also invoked once, synchronously, with the current
    /// value before `subscribe` returns.
    Immediate,
}

/// Handle to one active registration.
///
/// Dropping the handle does not cancel anything: a subscription stays live
/// until [`Subscription::unsubscribe`] is called. Clones share the same
/// cancellation state.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

struct SubscriptionInner {
    id: SubscriberId,
    cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Create a subscription whose cancellation runs `cancel` exactly once.
    pub fn new<F>(id: SubscriberId, cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            inner: Rc::new(SubscriptionInner {
                id,
                cancel: RefCell::new(Some(Box::new(cancel))),
            }),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self::new(SubscriberId::new(), || {})
    }

    /// Combine several subscriptions into one aggregate teardown handle.
    ///
    /// Cancelling the aggregate cancels every member in order.
    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        Self::new(SubscriberId::new(), move || {
            for subscription in subscriptions {
                subscription.unsubscribe();
            }
        })
    }

    /// Get the subscriber ID this handle cancels.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Cancel the registration. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        // Take the closure out before running it: cancellation may re-enter
        // this handle through a shared clone.
        let cancel = self.inner.cancel.borrow_mut().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether [`Subscription::unsubscribe`] has not been called yet.
    pub fn is_active(&self) -> bool {
        self.inner.cancel.borrow().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}
