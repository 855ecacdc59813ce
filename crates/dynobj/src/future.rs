// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-shot promise/future pair for call results.
//!
//! A [`Promise`] is completed exactly once, either explicitly or by being
//! dropped (which reports [`DispatchError::BrokenPromise`]). The matching
//! [`Future`] can be polled, blocked on, awaited from async code, or chained
//! with continuations. All clones of a future observe the same outcome.

use crate::error::DispatchError;
use crossbeam::channel;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Result delivered through a [`Future`].
pub type Outcome<T> = Result<T, DispatchError>;

type Continuation<T> = Box<dyn FnOnce(Arc<Outcome<T>>) + Send>;

struct Shared<T> {
    state: watch::Sender<Option<Arc<Outcome<T>>>>,
    /// `None` once the outcome has been delivered.
    continuations: Mutex<Option<Vec<Continuation<T>>>>,
}

impl<T: Send + Sync + 'static> Shared<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state,
            continuations: Mutex::new(Some(Vec::new())),
        }
    }

    fn deliver(&self, outcome: Outcome<T>) {
        let outcome = Arc::new(outcome);
        let pending = {
            let mut guard = self.continuations.lock();
            let Some(pending) = guard.take() else {
                return;
            };
            self.state.send_replace(Some(outcome.clone()));
            pending
        };
        for continuation in pending {
            continuation(outcome.clone());
        }
    }

    fn current(&self) -> Option<Arc<Outcome<T>>> {
        self.state.borrow().clone()
    }

    fn connect(&self, continuation: Continuation<T>) {
        {
            let mut guard = self.continuations.lock();
            if let Some(pending) = guard.as_mut() {
                pending.push(continuation);
                return;
            }
        }
        // already delivered: run inline
        if let Some(outcome) = self.current() {
            continuation(outcome);
        }
    }
}

/// Create a connected promise/future pair.
pub fn promise<T: Send + Sync + 'static>() -> (Promise<T>, Future<T>) {
    let shared = Arc::new(Shared::new());
    (
        Promise {
            shared: Some(shared.clone()),
        },
        Future { shared },
    )
}

/// Write side of a call result.
pub struct Promise<T: Send + Sync + 'static> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T: Send + Sync + 'static> Promise<T> {
    pub fn set_value(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            shared.deliver(Ok(value));
        }
    }

    pub fn set_error(mut self, error: DispatchError) {
        if let Some(shared) = self.shared.take() {
            shared.deliver(Err(error));
        }
    }

    pub fn set_outcome(mut self, outcome: Outcome<T>) {
        if let Some(shared) = self.shared.take() {
            shared.deliver(outcome);
        }
    }
}

impl<T: Send + Sync + 'static> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            log::debug!("promise dropped without a result");
            shared.deliver(Err(DispatchError::BrokenPromise));
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("pending", &self.shared.is_some())
            .finish()
    }
}

/// Read side of a call result.
pub struct Future<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Future<T> {
    /// A future that is already complete.
    pub fn ready(outcome: Outcome<T>) -> Self {
        let shared = Arc::new(Shared::new());
        shared.deliver(outcome);
        Self { shared }
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.borrow().is_some()
    }

    /// Outcome if already delivered, without blocking.
    pub fn try_result(&self) -> Option<Arc<Outcome<T>>> {
        self.shared.current()
    }

    /// Run `f` once the outcome is known. Runs inline, on the calling
    /// thread, if it already is.
    pub fn connect<F>(&self, f: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        self.shared
            .connect(Box::new(move |outcome: Arc<Outcome<T>>| f(&outcome)));
    }

    /// Block until the outcome is delivered.
    pub fn wait(&self) -> Arc<Outcome<T>> {
        if let Some(outcome) = self.try_result() {
            return outcome;
        }
        let (tx, rx) = channel::bounded(1);
        self.shared.connect(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        match rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Arc::new(Err(DispatchError::BrokenPromise)),
        }
    }

    /// Block for at most `timeout`; `None` if nothing was delivered.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Arc<Outcome<T>>> {
        if let Some(outcome) = self.try_result() {
            return Some(outcome);
        }
        let (tx, rx) = channel::bounded(1);
        self.shared.connect(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        rx.recv_timeout(timeout).ok()
    }

    /// Await the outcome from async code.
    pub async fn result(&self) -> Arc<Outcome<T>> {
        let mut rx = self.shared.state.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(state) => state
                .as_ref()
                .cloned()
                .unwrap_or_else(|| Arc::new(Err(DispatchError::BrokenPromise))),
            Err(_) => Arc::new(Err(DispatchError::BrokenPromise)),
        };
        outcome
    }

    /// Chain a transformation of the value; errors pass through unchanged.
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> Result<U, DispatchError> + Send + 'static,
    {
        let (promise, future) = promise();
        self.connect(move |outcome| match outcome {
            Ok(value) => promise.set_outcome(f(value)),
            Err(e) => promise.set_error(e.clone()),
        });
        future
    }
}

impl<T: Clone + Send + Sync + 'static> Future<T> {
    /// Block and clone out the value.
    pub fn wait_value(&self) -> Outcome<T> {
        match self.wait().as_ref() {
            Ok(value) => Ok(value.clone()),
            Err(e) => Err(e.clone()),
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_set_value_then_wait() {
        let (promise, future) = promise::<u32>();
        assert!(!future.is_ready());
        promise.set_value(7);
        assert!(future.is_ready());
        assert_eq!(future.wait_value(), Ok(7));
    }

    #[test]
    fn test_dropped_promise_breaks() {
        let (promise, future) = promise::<u32>();
        drop(promise);
        assert_eq!(future.wait_value(), Err(DispatchError::BrokenPromise));
    }

    #[test]
    fn test_wait_across_threads() {
        let (promise, future) = promise::<String>();
        let waiter = {
            let future = future.clone();
            thread::spawn(move || future.wait_value())
        };
        thread::sleep(Duration::from_millis(10));
        promise.set_value("done".to_string());
        assert_eq!(waiter.join().expect("join"), Ok("done".to_string()));
    }

    #[test]
    fn test_wait_timeout_expires() {
        let (_promise, future) = promise::<u32>();
        assert!(future.wait_timeout(Duration::from_millis(5)).is_none());
    }

    #[test]
    fn test_continuations_run_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (promise, future) = promise::<u32>();
        for _ in 0..3 {
            let hits = hits.clone();
            future.connect(move |outcome| {
                assert_eq!(outcome, &Ok(1));
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        promise.set_value(1);
        // late continuation runs inline
        let late = hits.clone();
        future.connect(move |_| {
            late.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_map_chains_and_propagates_errors() {
        let (promise, future) = promise::<u32>();
        let doubled = future.map(|v| Ok(v * 2));
        promise.set_value(21);
        assert_eq!(doubled.wait_value(), Ok(42));

        let failed = Future::<u32>::ready(Err(DispatchError::BrokenPromise)).map(|v| Ok(*v));
        assert_eq!(failed.wait_value(), Err(DispatchError::BrokenPromise));
    }

    #[tokio::test]
    async fn test_async_result() {
        let (promise, future) = promise::<u32>();
        let task = tokio::spawn({
            let future = future.clone();
            async move { future.result().await }
        });
        promise.set_value(5);
        let outcome = task.await.expect("join");
        assert_eq!(*outcome, Ok(5));
    }
}
