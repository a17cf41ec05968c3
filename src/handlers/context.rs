//! Handler context passed to each command handler.

use crate::error::ChatResult;
use crate::router::deliver;
use crate::state::{Hub, Identity, Mailbox, Outbound};
use std::sync::Arc;

pub struct Context<'a> {
    /// The requesting session.
    pub identity: &'a Identity,
    /// Shared server state.
    pub hub: &'a Arc<Hub>,
    /// The requesting session's own mailbox, for private replies.
    pub mailbox: &'a Mailbox,
}

impl<'a> Context<'a> {
    pub fn new(identity: &'a Identity, hub: &'a Arc<Hub>, mailbox: &'a Mailbox) -> Self {
        Self {
            identity,
            hub,
            mailbox,
        }
    }

    /// Send a line to the requester only, under the hub's delivery policy.
    pub async fn reply(&self, text: impl Into<Outbound>) -> ChatResult {
        deliver(
            self.identity,
            self.mailbox,
            text.into(),
            self.hub.delivery_policy(),
        )
        .await
    }
}
