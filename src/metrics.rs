//! Prometheus metrics collection for roomwarden.
//!
//! Exposed on the `/metrics` HTTP endpoint when `bot.metrics_port` is set.
//!
//! - `warden_transitions_total{kind}` - classified membership transitions
//! - `warden_propagations_total{action}` - bans/unbans replicated to other rooms
//! - `warden_command_total{command}` - commands executed
//! - `warden_action_failures_total{action,error}` - failed homeserver calls
//! - `warden_tracked_rooms` / `warden_welcome_rooms` - current state sizes

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Sync batches applied.
pub static SYNC_BATCHES: OnceLock<IntCounter> = OnceLock::new();

/// Timeline events dropped as stale (at or before the ready timestamp).
pub static STALE_EVENTS: OnceLock<IntCounter> = OnceLock::new();

/// Timeline events that could not be decoded.
pub static MALFORMED_EVENTS: OnceLock<IntCounter> = OnceLock::new();

/// Membership transitions by kind (join, leave, ban, unban, other).
pub static TRANSITIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Bans and unbans replicated into other rooms.
pub static PROPAGATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Commands executed by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command latency by name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by name and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Failed homeserver calls by action and error code.
pub static ACTION_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Welcome rooms evicted, by reason (departure, timeout).
pub static WELCOME_EVICTIONS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Monitored rooms with a live record.
pub static TRACKED_ROOMS: OnceLock<IntGauge> = OnceLock::new();

/// Welcome rooms currently open.
pub static WELCOME_ROOMS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup; the `record_*` helpers are no-ops until then.
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

    register!(SYNC_BATCHES, IntCounter::new("warden_sync_batches_total", "Sync batches applied"));
    register!(STALE_EVENTS, IntCounter::new("warden_stale_events_total", "Events dropped as older than startup"));
    register!(MALFORMED_EVENTS, IntCounter::new("warden_malformed_events_total", "Events that could not be decoded"));
    register!(TRANSITIONS, IntCounterVec::new(Opts::new("warden_transitions_total", "Membership transitions by kind"), &["kind"]));
    register!(PROPAGATIONS, IntCounterVec::new(Opts::new("warden_propagations_total", "Bans and unbans replicated to other rooms"), &["action"]));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("warden_command_total", "Commands executed by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("warden_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("warden_command_errors_total", "Command errors by name"), &["command", "error"]));
    register!(ACTION_FAILURES, IntCounterVec::new(Opts::new("warden_action_failures_total", "Failed homeserver calls"), &["action", "error"]));
    register!(WELCOME_EVICTIONS, IntCounterVec::new(Opts::new("warden_welcome_evictions_total", "Welcome rooms evicted"), &["reason"]));
    register!(TRACKED_ROOMS, IntGauge::new("warden_tracked_rooms", "Monitored rooms with a live record"));
    register!(WELCOME_ROOMS, IntGauge::new("warden_welcome_rooms", "Welcome rooms currently open"));
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
// Helper functions
// ============================================================================

fn inc_vec(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

#[inline]
pub fn record_sync_batch(malformed: usize) {
    if let Some(c) = SYNC_BATCHES.get() {
        c.inc();
    }
    if let Some(c) = MALFORMED_EVENTS.get() {
        c.inc_by(malformed as u64);
    }
}

#[inline]
pub fn record_stale_event() {
    if let Some(c) = STALE_EVENTS.get() {
        c.inc();
    }
}

#[inline]
pub fn record_transition(kind: &str) {
    inc_vec(&TRANSITIONS, &[kind]);
}

#[inline]
pub fn record_propagation(action: &str) {
    inc_vec(&PROPAGATIONS, &[action]);
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    inc_vec(&COMMAND_COUNTER, &[command]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    inc_vec(&COMMAND_ERRORS, &[command, error]);
}

#[inline]
pub fn record_action_failure(action: &str, error: &str) {
    inc_vec(&ACTION_FAILURES, &[action, error]);
}

#[inline]
pub fn record_welcome_eviction(reason: &str) {
    inc_vec(&WELCOME_EVICTIONS, &[reason]);
}

#[inline]
pub fn set_tracked_rooms(count: usize) {
    if let Some(g) = TRACKED_ROOMS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn set_welcome_rooms(count: usize) {
    if let Some(g) = WELCOME_ROOMS.get() {
        g.set(count as i64);
    }
}
