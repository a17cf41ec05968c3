//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::SocketAddr;

// =============================================================================
// Listener Defaults
// =============================================================================

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

// =============================================================================
// Session Defaults
// =============================================================================

pub fn default_idle_timeout_secs() -> u64 {
    10
}

pub fn default_mailbox_capacity() -> usize {
    10
}

pub fn default_broadcast_capacity() -> usize {
    10
}

pub fn default_max_line_length() -> usize {
    1024
}
