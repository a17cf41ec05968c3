//! `\who` - list connected sessions.

use super::Context;
use crate::error::ChatResult;
use tracing::debug;

/// Reply with one `userid:<identity>,username:<displayName>` line per
/// session, newline-joined, to the requester only.
pub async fn list_users(ctx: &Context<'_>) -> ChatResult {
    let snapshot = ctx.hub.registry.snapshot();
    debug!(count = snapshot.len(), "Listing users");

    let listing = snapshot
        .iter()
        .map(|info| info.listing_line())
        .collect::<Vec<_>>()
        .join("\n");

    ctx.reply(listing).await
}
