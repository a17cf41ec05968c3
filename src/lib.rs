//! huddle - a minimal multi-user line chat server.
//!
//! Every connected client is a session keyed by its remote address. Plain
//! lines are broadcast to everyone; `\who` and `\rename|<name>` are private
//! commands. Idle sessions are evicted after a configurable timeout.
//!
//! The binary (`huddled`) is a thin wrapper: it loads [`config::Config`],
//! builds a [`state::Hub`], spawns its [`router::BroadcastRouter`], and runs a
//! [`network::Gateway`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod network;
pub mod router;
pub mod state;
pub mod telemetry;
