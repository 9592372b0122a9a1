//! Runtime configuration.
//!
//! Everything here has a sensible default matching the shipped device; boards
//! override individual fields with the `with_*` setters before constructing
//! the [`Speaker`](crate::speaker::Speaker).

/// Tunables for the speaker core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakerConfig {
    /// Knob steps applied per raw encoder detent.
    pub volume_speed: i32,
    /// Period of the local input reconciler.
    pub volume_interval_ms: u32,
    /// Knob position at power-on.
    pub initial_system_volume: u8,
    /// Mute state of every channel at power-on.
    pub initial_mute: bool,
    /// Window for the whole preamble once its first byte arrived.
    pub preamble_timeout_ms: u32,
    /// Window for the 4-byte command token after the preamble.
    pub token_timeout_ms: u32,
    /// Green level while the heartbeat is lit.
    pub heartbeat_level: u8,
}

impl SpeakerConfig {
    pub const fn new() -> Self {
        SpeakerConfig {
            volume_speed: 10,
            volume_interval_ms: 50,
            initial_system_volume: 255,
            initial_mute: false,
            preamble_timeout_ms: 50,
            token_timeout_ms: 1000,
            heartbeat_level: 64,
        }
    }

    /// Knob steps per encoder detent.
    pub const fn with_volume_speed(mut self, speed: i32) -> Self {
        self.volume_speed = speed;
        self
    }

    /// Reconciler period in milliseconds.
    pub const fn with_volume_interval_ms(mut self, interval_ms: u32) -> Self {
        self.volume_interval_ms = interval_ms;
        self
    }

    /// Power-on knob position. Volume of every channel follows it.
    pub const fn with_initial_system_volume(mut self, level: u8) -> Self {
        self.initial_system_volume = level;
        self
    }

    /// Power-on mute of every channel.
    pub const fn with_initial_mute(mut self, mute: bool) -> Self {
        self.initial_mute = mute;
        self
    }

    /// Preamble and token windows of the serial command channel.
    pub const fn with_command_timeouts(mut self, preamble_ms: u32, token_ms: u32) -> Self {
        self.preamble_timeout_ms = preamble_ms;
        self.token_timeout_ms = token_ms;
        self
    }

    /// Green level of the lit heartbeat.
    pub const fn with_heartbeat_level(mut self, level: u8) -> Self {
        self.heartbeat_level = level;
        self
    }
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device() {
        let cfg = SpeakerConfig::default();
        assert_eq!(cfg.volume_speed, 10);
        assert_eq!(cfg.volume_interval_ms, 50);
        assert_eq!(cfg.initial_system_volume, 255);
        assert!(!cfg.initial_mute);
        assert_eq!(cfg.preamble_timeout_ms, 50);
        assert_eq!(cfg.token_timeout_ms, 1000);
    }

    #[test]
    fn setters_chain() {
        let cfg = SpeakerConfig::new()
            .with_volume_speed(3)
            .with_initial_system_volume(0)
            .with_initial_mute(true)
            .with_command_timeouts(10, 20);
        assert_eq!(cfg.volume_speed, 3);
        assert_eq!(cfg.initial_system_volume, 0);
        assert!(cfg.initial_mute);
        assert_eq!(cfg.preamble_timeout_ms, 10);
        assert_eq!(cfg.token_timeout_ms, 20);
        // untouched fields keep their defaults
        assert_eq!(cfg.volume_interval_ms, 50);
    }
}
