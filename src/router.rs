//! Broadcast router: the single consumer of the shared broadcast channel.
//!
//! Each message is copied into every mailbox present in a registry snapshot
//! taken when the message is dequeued. Because there is only one router and
//! it handles one message at a time, every session sees broadcasts in the
//! order they were published.
//!
//! A full mailbox never stalls the router. Depending on [`DeliveryPolicy`]
//! the message is dropped for that recipient straight away or after a short
//! bounded wait; other recipients are unaffected.

use crate::config::SessionSettings;
use crate::error::{ChatError, ChatResult};
use crate::state::{Identity, Mailbox, Outbound, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// What to do when a recipient's mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Drop the message for that recipient immediately.
    DropOnFull,
    /// Wait up to the given duration for space, then drop.
    WaitThenDrop(Duration),
}

impl From<&SessionSettings> for DeliveryPolicy {
    fn from(settings: &SessionSettings) -> Self {
        match settings.delivery_timeout {
            Some(wait) => Self::WaitThenDrop(wait),
            None => Self::DropOnFull,
        }
    }
}

/// Put one message into one mailbox under `policy`.
pub async fn deliver(
    identity: &Identity,
    mailbox: &Mailbox,
    msg: Outbound,
    policy: DeliveryPolicy,
) -> ChatResult {
    match policy {
        DeliveryPolicy::DropOnFull => mailbox.try_send(msg).map_err(|err| match err {
            TrySendError::Full(_) => ChatError::MailboxFull(identity.clone()),
            TrySendError::Closed(_) => ChatError::MailboxClosed(identity.clone()),
        }),
        DeliveryPolicy::WaitThenDrop(wait) => {
            mailbox
                .send_timeout(msg, wait)
                .await
                .map_err(|err| match err {
                    SendTimeoutError::Timeout(_) => ChatError::MailboxFull(identity.clone()),
                    SendTimeoutError::Closed(_) => ChatError::MailboxClosed(identity.clone()),
                })
        }
    }
}

/// Outcome of routing one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub dropped: usize,
}

pub struct BroadcastRouter {
    rx: mpsc::Receiver<Outbound>,
    registry: Arc<SessionRegistry>,
    policy: DeliveryPolicy,
}

impl BroadcastRouter {
    pub fn new(
        rx: mpsc::Receiver<Outbound>,
        registry: Arc<SessionRegistry>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            rx,
            registry,
            policy,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain the broadcast channel until every producer is gone.
    #[instrument(skip(self), name = "router")]
    pub async fn run(mut self) {
        info!(policy = ?self.policy, "Broadcast router started");
        while let Some(msg) = self.rx.recv().await {
            self.fan_out(msg).await;
        }
        info!("Broadcast router stopped");
    }

    /// Deliver one message to every currently registered session.
    pub async fn fan_out(&self, msg: Outbound) -> FanOut {
        let targets = self.registry.mailboxes();
        let mut result = FanOut::default();

        for (identity, mailbox) in &targets {
            match deliver(identity, mailbox, Arc::clone(&msg), self.policy).await {
                Ok(()) => result.delivered += 1,
                Err(ChatError::MailboxClosed(_)) => {
                    // Unregistered after the snapshot was taken.
                    debug!(%identity, "Skipping closed mailbox");
                }
                Err(e) => {
                    result.dropped += 1;
                    crate::metrics::record_dropped_delivery();
                    warn!(%identity, error = %e, "Dropped broadcast for slow session");
                }
            }
        }

        crate::metrics::record_fanout(result.delivered);
        debug!(
            recipients = targets.len(),
            delivered = result.delivered,
            dropped = result.dropped,
            "Broadcast routed"
        );
        result
    }
}
