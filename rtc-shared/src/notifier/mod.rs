//! Synchronous publish/subscribe notifications.
//!
//! A [`Notifier`] keeps, for every event kind, an ordered list of handlers.
//! Handlers registered with [`Notifier::on`] run on every emission, handlers
//! registered with [`Notifier::once`] are removed after their first run.
//!
//! Emission is synchronous: [`Notifier::emit`] does not return until every
//! handler registered for the event kind has run, on the caller's thread.
//! Teardown cascades rely on this, an owner listening for a child's
//! `stopped` event has already forgotten the child when `emit` returns.
//!
//! # Example
//!
//! ```
//! use rtc_shared::notifier::{Event, Notifier};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Lifecycle {
//!     Stopped,
//! }
//!
//! impl Event for Lifecycle {
//!     type Kind = Lifecycle;
//!
//!     fn kind(&self) -> Lifecycle {
//!         *self
//!     }
//! }
//!
//! let count = Arc::new(AtomicUsize::new(0));
//! let mut notifier = Notifier::new();
//! let c = Arc::clone(&count);
//! notifier.once(Lifecycle::Stopped, move |_| {
//!     c.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! notifier.emit(&Lifecycle::Stopped);
//! notifier.emit(&Lifecycle::Stopped);
//! assert_eq!(count.load(Ordering::SeqCst), 1);
//! ```

#[cfg(test)]
mod notifier_test;

use log::trace;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// An event dispatched through a [`Notifier`].
///
/// Listeners subscribe to an event *kind*, the payload-free discriminant of
/// the event, so an event carrying data (for example a newly created track)
/// can still be subscribed to before any instance exists.
pub trait Event {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handler closure invoked with the emitted event.
pub type Handler<E> = Box<dyn FnMut(&E) + Send + 'static>;

struct Listener<E> {
    once: bool,
    handler: Handler<E>,
}

/// Event name to ordered handler list mapping.
pub struct Notifier<E: Event> {
    listeners: HashMap<E::Kind, Vec<Listener<E>>>,
}

impl<E: Event> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<E: Event> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for (kind, listeners) in &self.listeners {
            m.entry(kind, &listeners.len());
        }
        m.finish()
    }
}

impl<E: Event> Notifier<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent handler for `kind`.
    pub fn on<F>(&mut self, kind: E::Kind, handler: F)
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.add_listener(kind, false, Box::new(handler));
    }

    /// Registers a handler for `kind` which is removed after its first run.
    pub fn once<F>(&mut self, kind: E::Kind, handler: F)
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.add_listener(kind, true, Box::new(handler));
    }

    fn add_listener(&mut self, kind: E::Kind, once: bool, handler: Handler<E>) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Listener { once, handler });
    }

    /// Runs every handler registered for the event's kind, in registration
    /// order, and returns how many handlers ran.
    pub fn emit(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let Some(mut listeners) = self.listeners.remove(&kind) else {
            trace!("emit {:?}: no listeners", kind);
            return 0;
        };

        let n = listeners.len();
        trace!("emit {:?} to {} listener(s)", kind, n);
        for listener in listeners.iter_mut() {
            (listener.handler)(event);
        }

        listeners.retain(|listener| !listener.once);
        if !listeners.is_empty() {
            self.listeners.insert(kind, listeners);
        }

        n
    }

    /// Number of handlers currently registered for `kind`.
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Drops every handler registered for `kind`.
    pub fn remove_all_listeners(&mut self, kind: E::Kind) {
        self.listeners.remove(&kind);
    }
}
