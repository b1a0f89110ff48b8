//! Network monitor.
//!
//! The platform transport feeds a single boolean connectivity signal into
//! [`NetworkMonitor::set_online`]; subscribers are notified on transitions
//! only, each through its own channel, so unsubscribing one never affects
//! the others.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A point-in-time connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub online: bool,
}

/// Identifier for one subscriber.
pub type SubscriberId = u64;

/// A registered subscription: receive transition events on `rx`, then call
/// [`NetworkMonitor::unsubscribe`] with `id` when done.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub rx: mpsc::UnboundedReceiver<NetworkState>,
}

/// Observes connectivity transitions.
///
/// Thread-safe and shared across components via `Arc`.
#[derive(Debug)]
pub struct NetworkMonitor {
    online: AtomicBool,
    next_id: AtomicU64,
    subscribers: DashMap<SubscriberId, mpsc::UnboundedSender<NetworkState>>,
}

impl NetworkMonitor {
    /// Create a monitor with an initial state.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            next_id: AtomicU64::new(1),
            subscribers: DashMap::new(),
        }
    }

    /// Create a monitor wrapped in `Arc` for sharing.
    pub fn new_shared(online: bool) -> Arc<Self> {
        Arc::new(Self::new(online))
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Current state as a value.
    pub fn current_state(&self) -> NetworkState {
        NetworkState {
            online: self.is_online(),
        }
    }

    /// Feed a connectivity reading from the platform transport.
    ///
    /// Subscribers are notified only when the state actually changes, not
    /// on every poll.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }

        tracing::info!(online, "connectivity changed");
        let state = NetworkState { online };
        let mut dead = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().send(state).is_err() {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.subscribers.remove(&id);
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, tx);
        Subscription { id, rx }
    }

    /// Remove one subscriber; others keep receiving.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(&id);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
