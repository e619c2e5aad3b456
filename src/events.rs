//! Event subscription with per-kind invocation semantics.
//!
//! Every event kind declares whether its handlers fire once (and are then
//! dropped) or on every dispatch.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Once,
    Repeated,
}

pub trait EventKind: Copy + Eq + Hash + Send + 'static {
    fn invocation(&self) -> Invocation;
}

pub trait Event {
    type Kind: EventKind;

    fn kind(&self) -> Self::Kind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send>;

struct Registered<E> {
    id: HandlerId,
    handler: Handler<E>,
}

pub struct Dispatcher<E: Event> {
    handlers: Mutex<HashMap<E::Kind, Vec<Registered<E>>>>,
    next_id: AtomicU64,
}

impl<E: Event> Default for Dispatcher<E> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E: Event> Dispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: E::Kind, handler: F) -> HandlerId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push(Registered {
                id,
                handler: Box::new(handler),
            });
        id
    }

    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's kind, in registration
    /// order, and return how many ran. Handlers must not dispatch on the same
    /// dispatcher.
    pub fn dispatch(&self, event: &E) -> usize {
        let kind = event.kind();
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(&kind) else {
            return 0;
        };

        for registered in list.iter_mut() {
            (registered.handler)(event);
        }
        let invoked = list.len();

        if kind.invocation() == Invocation::Once {
            handlers.remove(&kind);
        }
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Ready,
        Tick,
    }

    impl EventKind for Kind {
        fn invocation(&self) -> Invocation {
            match self {
                Kind::Ready => Invocation::Once,
                Kind::Tick => Invocation::Repeated,
            }
        }
    }

    enum TestEvent {
        Ready,
        Tick(u32),
    }

    impl Event for TestEvent {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            match self {
                TestEvent::Ready => Kind::Ready,
                TestEvent::Tick(_) => Kind::Tick,
            }
        }
    }

    #[test]
    fn test_once_handlers_fire_a_single_time() {
        let dispatcher = Dispatcher::<TestEvent>::new();
        let count = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&count);
        dispatcher.on(Kind::Ready, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.dispatch(&TestEvent::Ready), 1);
        assert_eq!(dispatcher.dispatch(&TestEvent::Ready), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.handler_count(Kind::Ready), 0);
    }

    #[test]
    fn test_repeated_handlers_fire_every_time() {
        let dispatcher = Dispatcher::<TestEvent>::new();
        let total = Arc::new(AtomicU64::new(0));
        let sum = Arc::clone(&total);
        dispatcher.on(Kind::Tick, move |event| {
            if let TestEvent::Tick(n) = event {
                sum.fetch_add(u64::from(*n), Ordering::SeqCst);
            }
        });

        dispatcher.dispatch(&TestEvent::Tick(2));
        dispatcher.dispatch(&TestEvent::Tick(3));

        assert_eq!(total.load(Ordering::SeqCst), 5);
        assert_eq!(dispatcher.handler_count(Kind::Tick), 1);
    }

    #[test]
    fn test_dispatch_only_reaches_matching_kind() {
        let dispatcher = Dispatcher::<TestEvent>::new();
        dispatcher.on(Kind::Tick, |_| {});

        assert_eq!(dispatcher.dispatch(&TestEvent::Ready), 0);
        assert_eq!(dispatcher.dispatch(&TestEvent::Tick(1)), 1);
    }

    #[test]
    fn test_off_removes_handler() {
        let dispatcher = Dispatcher::<TestEvent>::new();
        let first = dispatcher.on(Kind::Tick, |_| {});
        dispatcher.on(Kind::Tick, |_| {});

        assert!(dispatcher.off(first));
        assert!(!dispatcher.off(first));
        assert_eq!(dispatcher.dispatch(&TestEvent::Tick(1)), 1);
    }
}
