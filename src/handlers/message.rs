//! Plain chat lines.

use super::Context;
use crate::error::ChatResult;

/// Publish the line, unchanged, onto the shared broadcast channel.
pub async fn broadcast(ctx: &Context<'_>, text: String) -> ChatResult {
    ctx.hub.publish(text).await
}
