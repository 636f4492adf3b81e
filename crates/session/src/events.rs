//! Tab-local session notifications

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Something dependent UI should react to by re-reading session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A code exchange or stored session produced a live session
    Authenticated,
    /// A silent refresh replaced the tokens
    Refreshed,
    /// The user logged out
    SignedOut,
    /// A refresh failed and the session was cleared
    SessionExpired,
    /// The API rejected the bearer token
    ReauthRequired,
}

/// Registration token returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(SessionEvent)>;

/// Listener registry
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
}

impl EventBus {
    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` if the listener was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() < before
    }

    pub fn emit(&self, event: SessionEvent) {
        // Snapshot first so listeners may (un)subscribe while being notified
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
