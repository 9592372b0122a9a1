//! Control state store.
//!
//! [`DeviceControlState`] is the single owner of every value the host and the
//! local controls can change: per-channel mute/volume, the local volume knob,
//! the clock rate and the red/blue indicator levels derived from them. All
//! writers go through the methods here so the cross-field rules (paired
//! master mute, knob/volume mirroring) live in one place.

use crate::config::SpeakerConfig;
use crate::constants::{N_CONTROL_CHANNELS, SAMPLE_RATE_HZ, VOLUME_KNOB_SCALE};
use crate::error::ControlError;

/// A feature-unit channel number that has been bounds-checked.
///
/// Channel 0 is the master channel, 1 and 2 are left and right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    pub const MASTER: Channel = Channel(0);
    pub const LEFT: Channel = Channel(1);
    pub const RIGHT: Channel = Channel(2);

    /// Validate a raw channel number from a control request.
    pub fn new(number: u8) -> Result<Self, ControlError> {
        if (number as usize) < N_CONTROL_CHANNELS {
            Ok(Channel(number))
        } else {
            Err(ControlError::Validation {
                what: "channel number",
                expected: N_CONTROL_CHANNELS - 1,
                actual: number as usize,
            })
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Mute and volume of one feature-unit channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelControlState {
    pub mute: bool,
    /// Volume in 1/256 dB steps.
    pub volume: i16,
}

/// Process-wide control state, created once at startup.
pub struct DeviceControlState {
    channels: [ChannelControlState; N_CONTROL_CHANNELS],
    /// Local knob position, 0..=255.
    system_volume: u8,
    sample_rate: u32,
    red: u8,
    blue: u8,
}

impl DeviceControlState {
    /// Power-on state: every channel shares the configured mute, and the
    /// channel volumes agree with the knob through the ×100 mapping.
    pub fn new(config: &SpeakerConfig) -> Self {
        let level = config.initial_system_volume;
        let channel = ChannelControlState {
            mute: config.initial_mute,
            volume: knob_to_volume(level),
        };
        DeviceControlState {
            channels: [channel; N_CONTROL_CHANNELS],
            system_volume: level,
            sample_rate: SAMPLE_RATE_HZ,
            red: if config.initial_mute { 255 } else { 0 },
            blue: level,
        }
    }

    pub fn channel(&self, channel: Channel) -> ChannelControlState {
        self.channels[channel.index()]
    }

    pub fn mute(&self, channel: Channel) -> bool {
        self.channels[channel.index()].mute
    }

    pub fn volume(&self, channel: Channel) -> i16 {
        self.channels[channel.index()].volume
    }

    pub fn system_volume(&self) -> u8 {
        self.system_volume
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Red indicator level (mute).
    pub fn red(&self) -> u8 {
        self.red
    }

    /// Blue indicator level (volume).
    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Host write of a channel's mute. Returns `true` if the master mute
    /// changed.
    pub fn set_mute(&mut self, channel: Channel, mute: bool) -> bool {
        let master_before = self.channels[Channel::MASTER.index()].mute;
        self.channels[channel.index()].mute = mute;
        let master = self.channels[Channel::MASTER.index()].mute;
        self.red = mute_level(master);
        master != master_before
    }

    /// Host write of a channel's volume. Returns `true` if the master volume
    /// or the knob moved.
    ///
    /// The value is mirrored onto the local knob so that host- and
    /// device-driven changes converge on the same level.
    pub fn set_volume(&mut self, channel: Channel, volume: i16) -> bool {
        let slot = &mut self.channels[channel.index()].volume;
        let master_changed = channel == Channel::MASTER && *slot != volume;
        *slot = volume;

        let level = volume_to_knob(volume);
        let knob_changed = level != self.system_volume;
        self.system_volume = level;
        self.blue = level;
        master_changed || knob_changed
    }

    /// Local mute toggle. Master and left always move together.
    /// Returns the new master mute.
    pub fn toggle_master_mute(&mut self) -> bool {
        let mute = !self.channels[Channel::MASTER.index()].mute;
        self.channels[Channel::MASTER.index()].mute = mute;
        self.channels[Channel::LEFT.index()].mute = mute;
        self.red = mute_level(mute);

        debug_assert_eq!(
            self.channels[Channel::MASTER.index()].mute,
            self.channels[Channel::LEFT.index()].mute
        );
        mute
    }

    /// Local knob write. Updates master and left volume through the ×100
    /// mapping. Returns `true` if the knob moved.
    pub fn set_system_volume(&mut self, level: u8) -> bool {
        if level == self.system_volume {
            return false;
        }
        self.system_volume = level;
        self.blue = level;

        let volume = knob_to_volume(level);
        self.channels[Channel::MASTER.index()].volume = volume;
        self.channels[Channel::LEFT.index()].volume = volume;
        true
    }

    /// Host write of the clock rate. Not checked against the supported list.
    pub fn set_sample_rate(&mut self, hz: u32) {
        self.sample_rate = hz;
    }
}

fn mute_level(mute: bool) -> u8 {
    if mute {
        255
    } else {
        0
    }
}

/// Knob position → feature-unit volume. 255 × 100 fits in an `i16`.
pub fn knob_to_volume(level: u8) -> i16 {
    (level as i32 * VOLUME_KNOB_SCALE) as i16
}

/// Feature-unit volume → knob position, clamped into 0..=255.
pub fn volume_to_knob(volume: i16) -> u8 {
    (volume as i32 / VOLUME_KNOB_SCALE).clamp(0, 255) as u8
}
