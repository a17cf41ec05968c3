//! `\rename|<name>` - change the requester's display name.

use super::Context;
use crate::error::ChatResult;
use tracing::info;

pub const RENAME_ACK: &str = "rename successfully!";

pub async fn rename(ctx: &Context<'_>, new_name: &str) -> ChatResult {
    let previous = ctx.hub.registry.rename(ctx.identity, new_name)?;
    info!(from = %previous, to = %new_name, "Session renamed");
    ctx.reply(RENAME_ACK).await
}
