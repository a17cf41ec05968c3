//! The Hub - shared state handed to every session task.
//!
//! Holds the session registry and the producer side of the broadcast
//! channel. Nothing here is global: each `Hub` is an independent server
//! instance, which is what lets tests run several side by side.

use crate::config::SessionSettings;
use crate::error::{ChatError, ChatResult};
use crate::router::{BroadcastRouter, DeliveryPolicy};
use crate::state::registry::SessionRegistry;
use crate::state::session::Outbound;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Hub {
    /// Live sessions, keyed by identity.
    pub registry: Arc<SessionRegistry>,

    /// Many producers, one consumer (the router).
    broadcast_tx: mpsc::Sender<Outbound>,

    settings: SessionSettings,
}

impl Hub {
    /// Create the hub and the router that drains its broadcast channel.
    ///
    /// The router is returned unstarted; spawn it with
    /// [`BroadcastRouter::spawn`]. It stops once the hub is dropped.
    pub fn new(settings: SessionSettings) -> (Arc<Self>, BroadcastRouter) {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(settings.broadcast_capacity);
        let registry = Arc::new(SessionRegistry::new());
        let router = BroadcastRouter::new(
            broadcast_rx,
            Arc::clone(&registry),
            DeliveryPolicy::from(&settings),
        );
        let hub = Arc::new(Self {
            registry,
            broadcast_tx,
            settings,
        });
        (hub, router)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::from(&self.settings)
    }

    /// Queue a line for every session. Waits while the channel is full.
    pub async fn publish(&self, text: impl Into<Outbound>) -> ChatResult {
        self.broadcast_tx
            .send(text.into())
            .await
            .map_err(|_| ChatError::BroadcastClosed)
    }
}
