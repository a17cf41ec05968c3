//! Prometheus metrics collection for huddle.
//!
//! Metrics live in process-wide `OnceLock`s and are only populated by
//! [`init`]. Every recording helper is a no-op until then, so library users
//! and tests that never call `init` pay nothing.
//!
//! - `huddle_connected_sessions` - live sessions (gauge)
//! - `huddle_broadcasts_total` - messages routed by the broadcast router
//! - `huddle_deliveries_dropped_total` - per-recipient drops on full mailboxes
//! - `huddle_broadcast_fanout` - recipients per broadcast (histogram)
//! - `huddle_command_total{command}` / `huddle_command_duration_seconds{command}`
//! - `huddle_command_errors_total{error}`
//! - `huddle_disconnects_total{reason}`

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Gauges
// ========================================================================

/// Currently registered sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Counters
// ========================================================================

/// Broadcasts taken off the shared channel.
pub static BROADCASTS: OnceLock<IntCounter> = OnceLock::new();

/// Deliveries dropped because a mailbox stayed full.
pub static DELIVERIES_DROPPED: OnceLock<IntCounter> = OnceLock::new();

/// Commands processed by kind (who, rename, message).
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Session terminations by reason.
pub static DISCONNECTS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Command processing latency by kind.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Recipients per broadcast.
pub static BROADCAST_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Repeated calls keep the first set of metrics.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(CONNECTED_SESSIONS, IntGauge::new("huddle_connected_sessions", "Currently registered sessions"));
    register!(BROADCASTS, IntCounter::new("huddle_broadcasts_total", "Broadcasts routed"));
    register!(DELIVERIES_DROPPED, IntCounter::new("huddle_deliveries_dropped_total", "Deliveries dropped on full mailboxes"));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("huddle_command_total", "Commands processed by kind"), &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("huddle_command_errors_total", "Command errors by code"), &["error"]));
    register!(DISCONNECTS, IntCounterVec::new(Opts::new("huddle_disconnects_total", "Session terminations by reason"), &["reason"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("huddle_command_duration_seconds", "Command latency by kind")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["command"]));
    register!(BROADCAST_FANOUT, Histogram::with_opts(
        HistogramOpts::new("huddle_broadcast_fanout", "Recipients per broadcast")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}

/// Record one routed broadcast and how many mailboxes it reached.
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(c) = BROADCASTS.get() {
        c.inc();
    }
    if let Some(h) = BROADCAST_FANOUT.get() {
        h.observe(recipients as f64);
    }
}

#[inline]
pub fn record_dropped_delivery() {
    if let Some(c) = DELIVERIES_DROPPED.get() {
        c.inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn record_disconnect(reason: &str) {
    if let Some(c) = DISCONNECTS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_command("who", 0.001);
        record_disconnect("timed_out");
        record_fanout(3);

        let output = gather_metrics();
        assert!(output.contains("huddle_command_total"));
        assert!(output.contains("huddle_disconnects_total"));
        assert!(output.contains("huddle_broadcast_fanout"));
    }
}
