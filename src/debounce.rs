//! Debounced writer
//!
//! Coalesces rapid updates into one delayed flush of the latest value. One
//! timer is live at a time: each `schedule` bumps a generation counter and
//! stale timers see the mismatch and exit. A flush already running drains
//! whatever is pending before it finishes, so writes never run concurrently
//! and never go out of order. An explicit `flush` waits for a running drain
//! instead of returning early.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::Notify;

use crate::runtime;

type Sink<T> = Rc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()>>>>;

pub struct Debouncer<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    delay: Duration,
    pending: RefCell<Option<T>>,
    generation: Cell<u64>,
    flushing: Cell<bool>,
    /// Signalled whenever a drain finishes
    idle: Notify,
    sink: Sink<T>,
}

impl<T: 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, sink: F) -> Self
    where
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let sink: Sink<T> = Rc::new(move |value| -> Pin<Box<dyn Future<Output = ()>>> { Box::pin(sink(value)) });
        Self {
            inner: Rc::new(Inner {
                delay,
                pending: RefCell::new(None),
                generation: Cell::new(0),
                flushing: Cell::new(false),
                idle: Notify::new(),
                sink,
            }),
        }
    }

    /// Replace the pending value and restart the timer
    pub fn schedule(&self, value: T) {
        *self.inner.pending.borrow_mut() = Some(value);
        let generation = self.inner.bump();

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        let delay = self.inner.delay;
        runtime::spawn_local(async move {
            runtime::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            if inner.generation.get() != generation {
                return;
            }
            inner.drain().await;
        });
    }

    /// Drop the pending value and disarm the timer
    pub fn cancel(&self) {
        self.inner.bump();
        self.inner.pending.borrow_mut().take();
    }

    /// Write the pending value now instead of waiting for the timer.
    /// Returns once nothing is pending and no write is running.
    pub async fn flush(&self) {
        self.inner.bump();
        while self.inner.flushing.get() {
            self.inner.idle.notified().await;
        }
        self.inner.drain().await;
    }

    pub fn has_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }
}

impl<T> Inner<T> {
    fn bump(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    async fn drain(&self) {
        if self.flushing.replace(true) {
            return;
        }
        loop {
            let next = self.pending.borrow_mut().take();
            let Some(value) = next else { break };
            (self.sink)(value).await;
        }
        self.flushing.set(false);
        self.idle.notify_waiters();
    }
}
