use super::error_handling::{ReadErrorAction, classify_read_error, report_error};
use crate::handlers::{self, Context};
use crate::state::{SessionControl, SessionPhase};
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info};

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReadExit {
    /// EOF or read failure: the watchdog must be told to quit.
    RemoteClosed,
    /// Teardown already started elsewhere.
    Cancelled,
}

/// Read lines and dispatch them until the transport ends or the session is
/// torn down.
pub(super) async fn read_loop<R>(
    reader: R,
    ctx: &Context<'_>,
    control: &SessionControl,
) -> ReadExit
where
    R: AsyncRead + Unpin,
{
    let max_line_length = ctx.hub.settings().max_line_length;
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_length));
    // The codec ends its stream once after an error; resume instead of
    // treating that as EOF.
    let mut resuming = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = control.cancelled() => {
                debug!("Reader stopped by session teardown");
                return ReadExit::Cancelled;
            }
            next = lines.next() => next,
        };

        match next {
            Some(Ok(line)) => {
                resuming = false;
                if control.phase() >= SessionPhase::Closing {
                    return ReadExit::Cancelled;
                }
                if let Err(e) = handlers::dispatch(ctx, &line).await {
                    report_error(ctx, e).await;
                }
                control.touch();
            }
            Some(Err(e)) => match classify_read_error(e, max_line_length) {
                ReadErrorAction::Recoverable(err) => {
                    resuming = true;
                    report_error(ctx, err).await;
                    control.touch();
                }
                ReadErrorAction::Disconnect(err) => {
                    info!(error = %err, "Transport read failed");
                    return ReadExit::RemoteClosed;
                }
            },
            None if resuming => resuming = false,
            None => {
                info!("Remote closed connection");
                return ReadExit::RemoteClosed;
            }
        }
    }
}
