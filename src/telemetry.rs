//! Telemetry utilities: subscriber setup, command timing, and spans.

use std::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for applying one sync batch.
    pub fn sync_batch(cursor: &str) -> Span {
        info_span!("sync_batch", cursor = %cursor)
    }

    /// Span for a command execution.
    pub fn command(name: &str, sender: &str, room: &str) -> Span {
        info_span!("command", name = %name, sender = %sender, room = %room)
    }

    /// Span for joining and seeding a monitored room.
    pub fn room_bootstrap(room: &str) -> Span {
        info_span!("room_bootstrap", room = %room)
    }
}
