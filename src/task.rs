//! Single-threaded one-shot completion
//!
//! A `Deferred<T>` is settled once by the frame loop that owns it. Observers can
//! either register a synchronous callback with `then` or `.await` the value via
//! `wait()`. Everything runs on the browser's main thread, so state is shared
//! through `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

type Callback<T> = Box<dyn FnOnce(T)>;

struct DeferredState<T> {
    value: Option<T>,
    wakers: Vec<Waker>,
    callbacks: Vec<Callback<T>>,
}

pub struct Deferred<T> {
    state: Rc<RefCell<DeferredState<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Deferred<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(DeferredState {
                value: None,
                wakers: Vec::new(),
                callbacks: Vec::new(),
            })),
        }
    }

    /// Settle with `value`. Returns false if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        let (callbacks, wakers) = {
            let mut state = self.state.borrow_mut();
            if state.value.is_some() {
                return false;
            }
            state.value = Some(value.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.wakers),
            )
        };
        // Callbacks may register more callbacks or resolve other deferreds
        for callback in callbacks {
            callback(value.clone());
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    pub fn value(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }

    /// Run `callback` on settlement, or right away if already settled
    pub fn then(&self, callback: impl FnOnce(T) + 'static) {
        let ready = self.state.borrow().value.clone();
        match ready {
            Some(value) => callback(value),
            None => self.state.borrow_mut().callbacks.push(Box::new(callback)),
        }
    }

    pub fn wait(&self) -> Wait<T> {
        Wait {
            state: self.state.clone(),
        }
    }
}

/// Future returned by [`Deferred::wait`]
pub struct Wait<T> {
    state: Rc<RefCell<DeferredState<T>>>,
}

impl<T: Clone> Future for Wait<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();
        if let Some(value) = &state.value {
            return Poll::Ready(value.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
