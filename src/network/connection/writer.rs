//! Outbound writer: drains one session's mailbox onto its transport.
//!
//! Write failures are logged and further writes are skipped, but they never
//! end the session themselves. Teardown belongs to the watchdog alone.

use crate::state::{MailboxReceiver, Outbound, SessionControl};
use futures_util::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::{debug, warn};

/// Upper bound on flushing queued lines once teardown starts.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

struct Outlet<W> {
    sink: FramedWrite<W, LinesCodec>,
    healthy: bool,
}

impl<W: AsyncWrite + Unpin> Outlet<W> {
    async fn write(&mut self, msg: Outbound) {
        if !self.healthy {
            return;
        }
        if let Err(e) = self.sink.send(msg).await {
            warn!(error = %e, "Write to client failed");
            self.healthy = false;
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = SinkExt::<Outbound>::close(&mut self.sink).await {
            debug!(error = %e, "Transport shutdown failed");
        }
    }
}

pub(super) async fn write_loop<W>(
    writer: W,
    mut outbox: MailboxReceiver,
    control: Arc<SessionControl>,
) where
    W: AsyncWrite + Unpin,
{
    let mut outlet = Outlet {
        sink: FramedWrite::new(writer, LinesCodec::new()),
        healthy: true,
    };

    loop {
        tokio::select! {
            biased;
            msg = outbox.recv() => match msg {
                Some(msg) => {
                    tokio::select! {
                        biased;
                        _ = outlet.write(msg) => {}
                        _ = control.cancelled() => break,
                    }
                }
                None => break,
            },
            _ = control.cancelled() => break,
        }
    }

    // The session is out of the registry by now, so nothing new targets
    // this mailbox. Flush what is queued, then close the transport.
    outbox.close();
    let drain = async {
        while let Some(msg) = outbox.recv().await {
            outlet.write(msg).await;
        }
        outlet.shutdown().await;
    };
    if tokio::time::timeout(CLOSE_GRACE, drain).await.is_err() {
        warn!("Gave up flushing outbound queue");
    }
    debug!("Writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::mailbox;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn writes_lines_in_order_and_closes_with_mailbox() {
        let (client, server) = tokio::io::duplex(1024);
        let (tx, rx) = mailbox(8);
        let control = Arc::new(SessionControl::new());
        let writer = tokio::spawn(write_loop(server, rx, control));

        tx.send(Outbound::from("one")).await.unwrap();
        tx.send(Outbound::from("two\nthree")).await.unwrap();
        drop(tx);
        writer.await.unwrap();

        let mut out = String::new();
        let mut client = client;
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn cancellation_flushes_queued_lines_then_closes() {
        let (mut client, server) = tokio::io::duplex(1024);
        let (tx, rx) = mailbox(8);
        let control = Arc::new(SessionControl::new());

        tx.send(Outbound::from("queued")).await.unwrap();
        control.cancel();
        // A producer still holds the mailbox; cancellation alone must end the writer.
        write_loop(server, rx, Arc::clone(&control)).await;

        let mut out = String::new();
        client.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "queued\n");
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn write_failure_does_not_end_the_writer() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let (tx, rx) = mailbox(8);
        let control = Arc::new(SessionControl::new());
        let writer = tokio::spawn(write_loop(server, rx, control));

        tx.send(Outbound::from("lost")).await.unwrap();
        tx.send(Outbound::from("also lost")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!writer.is_finished());

        drop(tx);
        writer.await.unwrap();
    }
}
