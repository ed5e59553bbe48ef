//! Synchronous begin/rendered/end notifications

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Ripple lifecycle events, carrying the surface where one is involved
#[derive(Debug, Clone)]
pub enum RippleEvent<S> {
    /// Pointer press started a ripple
    Begin(S),
    /// Every block is visible
    Rendered,
    /// Surface faded out and was removed
    End(S),
}

impl<S> RippleEvent<S> {
    pub fn name(&self) -> &'static str {
        match self {
            RippleEvent::Begin(_) => "begin",
            RippleEvent::Rendered => "rendered",
            RippleEvent::End(_) => "end",
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, RippleEvent::End(_))
    }

    pub fn surface(&self) -> Option<&S> {
        match self {
            RippleEvent::Begin(s) | RippleEvent::End(s) => Some(s),
            RippleEvent::Rendered => None,
        }
    }
}

pub type ListenerId = u64;

struct Listener<E> {
    id: ListenerId,
    once: bool,
    callback: Rc<dyn Fn(&E)>,
}

/// Observer list. Listeners run in registration order.
pub struct Emitter<E> {
    listeners: RefCell<Vec<Listener<E>>>,
    next_id: Cell<ListenerId>,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, callback: impl Fn(&E) + 'static) -> ListenerId {
        self.add(callback, false)
    }

    /// Listener removed after its first call
    pub fn once(&self, callback: impl Fn(&E) + 'static) -> ListenerId {
        self.add(callback, true)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Call every current listener with `event`
    pub fn emit(&self, event: &E) {
        // Snapshot so listeners can subscribe or unsubscribe while we iterate
        let current: Vec<Rc<dyn Fn(&E)>> = {
            let mut listeners = self.listeners.borrow_mut();
            let snapshot = listeners.iter().map(|l| l.callback.clone()).collect();
            listeners.retain(|l| !l.once);
            snapshot
        };
        for callback in current {
            callback(event);
        }
    }

    fn add(&self, callback: impl Fn(&E) + 'static, once: bool) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            once,
            callback: Rc::new(callback),
        });
        id
    }
}
