//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `false` (for serde defaults).
pub fn default_false() -> bool {
    false
}

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_prefix() -> String {
    "!".to_string()
}

/// Long-poll timeout handed to `/sync`, in milliseconds.
pub fn default_sync_timeout_ms() -> u64 {
    10_000
}

pub fn default_rejoin_delay_secs() -> u64 {
    5
}

/// Pause after a failed poll before trying again.
pub fn default_poll_retry_secs() -> u64 {
    5
}

pub fn default_heartbeat_secs() -> u64 {
    1800
}

pub fn default_reboot_delay_secs() -> u64 {
    5
}

// =============================================================================
// Action Defaults
// =============================================================================

pub fn default_actions_per_second() -> u32 {
    2
}

pub fn default_action_burst() -> u32 {
    5
}

// =============================================================================
// Welcome Defaults
// =============================================================================

pub fn default_welcome_lifetime_secs() -> u64 {
    3600
}

pub fn default_welcome_sweep_secs() -> u64 {
    60
}

pub fn default_welcome_room_name() -> String {
    "Welcome".to_string()
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals_are_non_zero() {
        assert!(default_sync_timeout_ms() > 0);
        assert!(default_welcome_sweep_secs() > 0);
        assert!(default_welcome_lifetime_secs() >= default_welcome_sweep_secs());
        assert!(default_actions_per_second() > 0);
        assert!(!default_false());
    }
}
