//! Command dispatch.
//!
//! Each inbound line is parsed into a [`Command`] and routed to its handler.
//! Handlers either reply privately through [`Context::reply`] or publish to
//! the shared broadcast channel; they never write to a transport directly.

mod command;
mod context;
mod message;
mod rename;
mod who;

pub use command::Command;
pub use context::Context;
pub use rename::RENAME_ACK;

use crate::error::{ChatError, ChatResult};
use crate::telemetry::CommandTimer;
use tracing::debug;

/// Parse and execute one inbound line.
///
/// `MalformedCommand` comes back as an error; the caller reports it to the
/// client and the session carries on.
pub async fn dispatch(ctx: &Context<'_>, line: &str) -> ChatResult {
    let command = Command::parse(line);
    let _timer = CommandTimer::new(command.kind());
    debug!(identity = %ctx.identity, command = command.kind(), "Dispatching");

    match command {
        Command::ListUsers => who::list_users(ctx).await,
        Command::Rename(name) => rename::rename(ctx, &name).await,
        Command::Broadcast(text) => message::broadcast(ctx, text).await,
        Command::Malformed(reason) => Err(ChatError::MalformedCommand(reason)),
    }
}
