//! Mount lifecycle.
//!
//! A node is mounted while it is connected to a [`Document`](super::Document)
//! body. Callbacks registered here fire on every transition, so a node that
//! is detached and re-attached mounts again.

use std::cell::RefCell;
use std::rc::Rc;

use super::node::Node;
use crate::reactive::{ReadSignal, SignalValue, SubscribeMode, Subscription};

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
pub(crate) struct Lifecycle {
    mount: RefCell<Vec<Callback>>,
    unmount: RefCell<Vec<Callback>>,
}

impl Lifecycle {
    pub(crate) fn mounted(&self) {
        let callbacks = self.mount.borrow().clone();
        for callback in callbacks {
            callback();
        }
    }

    pub(crate) fn unmounted(&self) {
        let callbacks = self.unmount.borrow().clone();
        for callback in callbacks {
            callback();
        }
    }
}

/// Mount-scoped capabilities of a node.
///
/// Callbacks are stored on the node itself. They should capture the node
/// weakly (see [`Node::downgrade`]) or the node will keep itself alive.
pub trait Mountable {
    /// Run `callback` on every mount. Runs once right away if the node is
    /// already connected.
    fn on_mount<F>(&self, callback: F)
    where
        F: Fn() + 'static;

    /// Run `callback` on every unmount.
    fn on_unmount<F>(&self, callback: F)
    where
        F: Fn() + 'static;

    /// Subscribe `callback` to `signal` while the node is mounted.
    ///
    /// The subscription is made on mount (with `mode`) and released on
    /// unmount.
    fn follow<T, F>(&self, signal: &ReadSignal<T>, callback: F, mode: SubscribeMode)
    where
        T: SignalValue,
        F: Fn(&T) + 'static;
}

impl Mountable for Node {
    fn on_mount<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        let callback: Callback = Rc::new(callback);
        self.data()
            .lifecycle
            .mount
            .borrow_mut()
            .push(Rc::clone(&callback));
        if self.is_connected() {
            callback();
        }
    }

    fn on_unmount<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.data()
            .lifecycle
            .unmount
            .borrow_mut()
            .push(Rc::new(callback));
    }

    fn follow<T, F>(&self, signal: &ReadSignal<T>, callback: F, mode: SubscribeMode)
    where
        T: SignalValue,
        F: Fn(&T) + 'static,
    {
        let active: Rc<RefCell<Option<Subscription>>> = Rc::default();
        let callback = Rc::new(callback);

        let signal = signal.clone();
        let slot = Rc::clone(&active);
        self.on_mount(move || {
            let callback = Rc::clone(&callback);
            let subscription = signal.subscribe(move |value| callback(value), mode);
            let previous = slot.borrow_mut().replace(subscription);
            if let Some(previous) = previous {
                previous.unsubscribe();
            }
        });

        self.on_unmount(move || {
            let subscription = active.borrow_mut().take();
            if let Some(subscription) = subscription {
                subscription.unsubscribe();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Element};
    use crate::reactive::Signal;
    use std::cell::Cell;

    #[test]
    fn mount_and_unmount_fire_on_transitions() {
        let document = Document::new();
        let div = Element::new("div");
        let mounts = Rc::new(Cell::new(0));
        let unmounts = Rc::new(Cell::new(0));
        {
            let mounts = mounts.clone();
            div.on_mount(move || mounts.set(mounts.get() + 1));
            let unmounts = unmounts.clone();
            div.on_unmount(move || unmounts.set(unmounts.get() + 1));
        }

        document.mount([div.node().clone()]);
        assert_eq!(mounts.get(), 1);

        div.remove();
        assert_eq!(unmounts.get(), 1);

        document.mount([div.node().clone()]);
        assert_eq!(mounts.get(), 2);
    }

    #[test]
    fn on_mount_runs_now_when_connected() {
        let document = Document::new();
        let div = Element::new("div");
        document.mount([div.node().clone()]);

        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        div.on_mount(move || flag.set(true));
        assert!(ran.get());
    }

    #[test]
    fn nested_nodes_mount_with_their_ancestor() {
        let document = Document::new();
        let outer = Element::new("div");
        let inner = Element::new("span");
        outer.append_child(&inner);

        let mounted = Rc::new(Cell::new(false));
        let flag = mounted.clone();
        inner.on_mount(move || flag.set(true));

        document.mount([outer.node().clone()]);
        assert!(mounted.get());
        assert!(inner.is_connected());
    }

    #[test]
    fn follow_is_scoped_to_mount() {
        let document = Document::new();
        let signal = Signal::new(1);
        let comment = Node::comment("anchor");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        comment.follow(&signal, move |value| sink.borrow_mut().push(*value), SubscribeMode::Immediate);

        signal.set(2);
        assert!(seen.borrow().is_empty());
        assert_eq!(signal.subscriber_count(), 0);

        document.mount([comment.clone()]);
        signal.set(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);

        comment.remove();
        signal.set(4);
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
