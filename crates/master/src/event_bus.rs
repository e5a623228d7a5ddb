// SPDX-License-Identifier: MIT

//! In-process publish/subscribe event bus (`spec.md` §4.8).
//!
//! Listeners register against a dotted event name and run on a bounded pool
//! of tokio tasks rather than inline in the publisher — a listener that
//! blocks or panics must never stall or crash the scheduler tick that
//! published the event. `publish` fires-and-forgets; `publish_and_wait` is
//! for the init hooks, which need every `PRE` listener to finish its setup
//! before the `POST` half of the same operation runs.

use mirrord_core::Event;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Matches the source's `ThreadPoolExecutor(max_workers=20)`.
const MAX_CONCURRENT_LISTENERS: usize = 20;

pub type Listener = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<&'static str, Vec<Listener>>>>,
    pool: Arc<Semaphore>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            pool: Arc::new(Semaphore::new(MAX_CONCURRENT_LISTENERS)),
        }
    }

    /// Register `listener` for every event whose name equals `event_name`.
    pub fn on(&self, event_name: &'static str, listener: Listener) {
        self.listeners.lock().entry(event_name).or_default().push(listener);
    }

    /// Drop every listener registered for `event_name`.
    pub fn off(&self, event_name: &'static str) {
        self.listeners.lock().remove(event_name);
    }

    /// Publish `event` without waiting for listeners to finish.
    pub async fn publish(&self, event: Event) {
        self.dispatch(event, false).await;
    }

    /// Publish `event` and wait for every listener to finish running. Used at
    /// the `*.PRE` hooks, where later setup depends on listener side effects
    /// having already happened.
    pub async fn publish_and_wait(&self, event: Event) {
        self.dispatch(event, true).await;
    }

    async fn dispatch(&self, event: Event, wait: bool) {
        let listeners = {
            let guard = self.listeners.lock();
            guard.get(event.name()).cloned().unwrap_or_default()
        };
        if listeners.is_empty() {
            return;
        }

        let mut handles = Vec::with_capacity(listeners.len());
        for listener in listeners {
            let event = event.clone();
            let pool = Arc::clone(&self.pool);
            handles.push(tokio::spawn(async move {
                let _permit = pool.acquire().await;
                run_listener(&event, listener.as_ref());
            }));
        }

        if wait {
            for handle in handles {
                if handle.await.is_err() {
                    tracing::error!("event listener task panicked");
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one listener, containing a panic the way the source's
/// `_execute_listener` contains an exception: log it, never propagate it.
fn run_listener(event: &Event, listener: &(dyn Fn(&Event) + Send + Sync)) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(event)));
    if outcome.is_err() {
        tracing::error!(event = event.name(), "event listener panicked");
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
