//! Idle watchdog: owns the one authoritative teardown of a session.
//!
//! Three events race: an explicit quit from the reader, a reset after each
//! dispatched line, and the idle timer. Quit or timeout run [`Watchdog::terminate`],
//! which is gated by [`SessionControl::begin_close`] so it executes at most
//! once no matter how many paths ask for it.

use crate::state::{DepartureReason, Hub, Identity, Presence, SessionControl};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

pub(crate) struct Watchdog {
    identity: Identity,
    hub: Arc<Hub>,
    control: Arc<SessionControl>,
    idle_timeout: Duration,
}

impl Watchdog {
    pub(crate) fn new(identity: Identity, hub: Arc<Hub>, control: Arc<SessionControl>) -> Self {
        let idle_timeout = hub.settings().idle_timeout;
        Self {
            identity,
            hub,
            control,
            idle_timeout,
        }
    }

    /// Wait for quit or idle timeout, then tear the session down.
    ///
    /// A dropped quit sender counts as quit. Returns the reason if this call
    /// performed the teardown.
    pub(crate) async fn run(self, mut quit: oneshot::Receiver<()>) -> Option<DepartureReason> {
        let reason = loop {
            tokio::select! {
                _ = &mut quit => break DepartureReason::Exited,
                _ = self.control.reset_requested() => {
                    trace!("Idle timer reset");
                }
                _ = tokio::time::sleep(self.idle_timeout) => break DepartureReason::TimedOut,
            }
        };

        self.terminate(reason).await.then_some(reason)
    }

    /// Unregister, announce the departure, then close the transport.
    ///
    /// Returns `false` if teardown had already begun.
    pub(crate) async fn terminate(&self, reason: DepartureReason) -> bool {
        if !self.control.begin_close() {
            debug!(%reason, "Teardown already in progress");
            return false;
        }

        let display_name = match self.hub.registry.unregister(&self.identity) {
            Ok(session) => session.display_name,
            Err(e) => {
                debug!(error = %e, "Session was already unregistered");
                self.identity.to_string()
            }
        };

        let notice = Presence::Departed(reason).notice(&self.identity, &display_name);
        if let Err(e) = self.hub.publish(notice).await {
            warn!(error = %e, "Could not publish departure notice");
        }

        crate::metrics::record_disconnect(reason.label());
        info!(%reason, name = %display_name, "Session terminated");
        self.control.cancel();
        true
    }
}
