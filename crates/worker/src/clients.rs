// SPDX-License-Identifier: MIT

//! Tracks control-socket connections so `job_finished` notifications can be
//! pushed to every listener (`spec.md` §4.5, §4.8 — the worker's half of the
//! event bus is "push to whoever is connected").
//!
//! Response frames and pushed notifications share the same write half of a
//! connection, so each client is wrapped in an async mutex rather than a
//! plain write handle.

use mirrord_wire::{send, Notification, ProtocolError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;

pub type ClientHandle = Arc<AsyncMutex<OwnedWriteHalf>>;

#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<Vec<ClientHandle>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, write_half: OwnedWriteHalf) -> ClientHandle {
        let handle: ClientHandle = Arc::new(AsyncMutex::new(write_half));
        self.clients.lock().push(Arc::clone(&handle));
        handle
    }

    pub fn unregister(&self, handle: &ClientHandle) {
        self.clients.lock().retain(|c| !Arc::ptr_eq(c, handle));
    }

    /// Push a notification to every connected client, dropping any whose
    /// write fails. Returns how many deliveries succeeded — zero means the
    /// caller should hold onto whatever triggered the notification and try
    /// again later rather than treat it as delivered.
    pub async fn broadcast(&self, notification: &Notification) -> usize {
        let targets: Vec<ClientHandle> = self.clients.lock().clone();
        let mut delivered = 0;
        let mut dead = Vec::new();

        for client in &targets {
            let mut guard = client.lock().await;
            match send(&mut *guard, notification).await {
                Ok(()) => delivered += 1,
                Err(ProtocolError::Io(_)) | Err(ProtocolError::ConnectionClosed) => {
                    dead.push(Arc::clone(client));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to encode notification for client");
                }
            }
        }

        if !dead.is_empty() {
            let mut clients = self.clients.lock();
            clients.retain(|c| !dead.iter().any(|d| Arc::ptr_eq(c, d)));
        }
        delivered
    }
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod tests;
