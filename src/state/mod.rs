//! State management module.
//!
//! Contains the Hub (shared server state), the session registry and the
//! per-session types.

mod hub;
mod registry;
mod session;

pub use hub::Hub;
pub use registry::SessionRegistry;
pub use session::{
    DepartureReason, Identity, Mailbox, MailboxReceiver, Outbound, Presence, Session,
    SessionControl, SessionInfo, SessionPhase, mailbox,
};
