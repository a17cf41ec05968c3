//! Connection - drives one client session from accept to close.
//!
//! Each connection runs three cooperating tasks:
//!
//! ```text
//!              ┌──────────────┐  dispatch   ┌────────────┐
//!  transport ─►│  read loop   ├────────────►│  handlers  ├──► broadcast channel ──► router
//!              └──────┬───────┘             └─────┬──────┘                            │
//!                     │ touch / quit              │ private reply                     │
//!                     ▼                           ▼                                   │
//!              ┌──────────────┐             ┌────────────┐                            │
//!              │   watchdog   │             │  mailbox   │◄───────────────────────────┘
//!              └──────┬───────┘             └─────┬──────┘
//!                     │ cancel                    ▼
//!                     └──────────────────►  ┌────────────┐
//!                                           │   writer   ├──► transport
//!                                           └────────────┘
//! ```
//!
//! The watchdog alone performs teardown. The read loop only tells it to
//! quit; the writer only stops when told to or when the mailbox closes.

mod error_handling;
mod event_loop;
mod watchdog;
mod writer;

use event_loop::{ReadExit, read_loop};
use watchdog::Watchdog;
use writer::write_loop;

use crate::error::ChatResult;
use crate::handlers::Context;
use crate::state::{Hub, Identity, Presence, Session, SessionControl, mailbox};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tracing::{Instrument, info, instrument, warn};

/// A client connection handler, generic over the byte stream it serves.
pub struct Connection<S> {
    identity: Identity,
    stream: S,
    hub: Arc<Hub>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(identity: Identity, stream: S, hub: Arc<Hub>) -> Self {
        Self {
            identity,
            stream,
            hub,
        }
    }

    /// Serve the session until it is torn down.
    ///
    /// Returns once the writer and watchdog have both finished. Fails only
    /// if the identity is already registered, in which case the stream is
    /// closed without ever becoming a session.
    #[instrument(skip(self), fields(identity = %self.identity), name = "connection")]
    pub async fn run(self) -> ChatResult {
        let Self {
            identity,
            stream,
            hub,
        } = self;
        let settings = *hub.settings();

        let (read_half, write_half) = tokio::io::split(stream);
        let (mailbox, outbox) = mailbox(settings.mailbox_capacity);
        let control = Arc::new(SessionControl::new());

        // Connecting
        hub.registry
            .register(Session::new(identity.clone(), mailbox.clone()))?;
        info!("Client connected");

        let writer = tokio::spawn(
            write_loop(write_half, outbox, Arc::clone(&control)).in_current_span(),
        );
        let (quit_tx, quit_rx) = oneshot::channel();
        let watchdog = tokio::spawn(
            Watchdog::new(identity.clone(), Arc::clone(&hub), Arc::clone(&control))
                .run(quit_rx)
                .in_current_span(),
        );

        let login = Presence::LoggedIn.notice(&identity, identity.as_str());
        if let Err(e) = hub.publish(login).await {
            warn!(error = %e, "Could not publish login notice");
        }

        // Active
        if control.activate() {
            let ctx = Context::new(&identity, &hub, &mailbox);
            if read_loop(read_half, &ctx, &control).await == ReadExit::RemoteClosed {
                // Ignored if the watchdog already finished.
                let _ = quit_tx.send(());
            }
        }
        drop(mailbox);

        // Closing
        let reason = match watchdog.await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(error = %e, "Watchdog task failed");
                control.cancel();
                None
            }
        };
        if let Err(e) = writer.await {
            warn!(error = %e, "Writer task failed");
        }

        // Closed
        control.finish();
        info!(reason = ?reason, "Client disconnected");
        Ok(())
    }
}
