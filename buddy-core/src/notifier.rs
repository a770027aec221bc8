//! Listener registry for save-change notifications.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Ordered list of zero-argument callbacks invoked synchronously after
/// each successful derivation. Never fired for a skipped update.
#[derive(Default)]
pub struct ChangeNotifier {
    registry: Rc<RefCell<Registry>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered until the returned handle
    /// is explicitly unsubscribed; dropping the handle keeps it alive.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Rc::new(callback)));
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Invoke every registered callback in registration order. Iterates a
    /// snapshot, so callbacks may subscribe or unsubscribe freely; anyone
    /// added mid-notify is first called on the next round.
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in snapshot {
            callback();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }
}

/// Handle for removing a registered callback.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Subscription {
    /// Remove the callback. A no-op when the notifier is already gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.borrow_mut();
            if let Some(pos) = registry.entries.iter().position(|(id, _)| *id == self.id) {
                registry.entries.remove(pos);
            }
        }
    }
}
