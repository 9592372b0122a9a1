//! Audio data gate.
//!
//! Every received [`AudioBlock`] is forwarded to the output with the gain the
//! current knob position maps to on the [ramp](crate::ramp), or zero while
//! the master channel is muted. Blocks are consumed in the same loop
//! iteration they arrive in; there is no queue behind the gate.

use crate::constants::{AUDIO_BLOCK_BYTES, RESOLUTIONS_PER_FORMAT};
use crate::error::ControlError;
use crate::ramp;
use crate::state::{Channel, DeviceControlState};

/// One received chunk of the speaker stream.
#[derive(Clone)]
pub struct AudioBlock {
    data: [u8; AUDIO_BLOCK_BYTES],
    len: usize,
    /// Valid bits per sample for the active streaming format.
    resolution: u8,
}

impl AudioBlock {
    /// An empty block at the given resolution.
    pub const fn new(resolution: u8) -> Self {
        AudioBlock {
            data: [0; AUDIO_BLOCK_BYTES],
            len: 0,
            resolution,
        }
    }

    /// Copy a received packet. Packets larger than the buffer are rejected.
    pub fn from_bytes(bytes: &[u8], resolution: u8) -> Result<Self, ControlError> {
        if bytes.len() > AUDIO_BLOCK_BYTES {
            return Err(ControlError::Validation {
                what: "audio packet size",
                expected: AUDIO_BLOCK_BYTES,
                actual: bytes.len(),
            });
        }
        let mut block = Self::new(resolution);
        block.data[..bytes.len()].copy_from_slice(bytes);
        block.len = bytes.len();
        Ok(block)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Container size of one sample: 2 bytes up to 16-bit, 4 bytes above.
    pub fn subslot_size(&self) -> usize {
        if self.resolution <= 16 {
            2
        } else {
            4
        }
    }
}

/// Bit resolution selected by a streaming alternate setting (1-based).
pub fn resolution_for_alt(alt: u8) -> Option<u8> {
    let index = (alt as usize).checked_sub(1)?;
    RESOLUTIONS_PER_FORMAT.get(index).copied()
}

/// The audio output (I2S driver, DAC, ...).
pub trait AudioSink {
    /// Play `block` scaled by `gain` (0 = silence, 255 = unity).
    fn give_buffer(&mut self, block: &AudioBlock, gain: u8);
}

/// Applies volume and mute to the speaker stream.
#[derive(Default)]
pub struct AudioGate {
    forwarded: u32,
}

impl AudioGate {
    pub const fn new() -> Self {
        AudioGate { forwarded: 0 }
    }

    /// Gain for the current state.
    pub fn current_gain(state: &DeviceControlState) -> u8 {
        if state.mute(Channel::MASTER) {
            0
        } else {
            ramp::gain(state.system_volume())
        }
    }

    /// Forward `block` to `sink` and consume it. Returns the gain applied.
    pub fn process<S: AudioSink>(&mut self, block: AudioBlock, state: &DeviceControlState, sink: &mut S) -> u8 {
        let gain = Self::current_gain(state);
        sink.give_buffer(&block, gain);
        self.forwarded = self.forwarded.wrapping_add(1);
        gain
    }

    /// Blocks forwarded since startup (wraps).
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeakerConfig;

    #[derive(Default)]
    struct LastGain {
        gain: Option<u8>,
        len: usize,
        resolution: u8,
    }

    impl AudioSink for LastGain {
        fn give_buffer(&mut self, block: &AudioBlock, gain: u8) {
            self.gain = Some(gain);
            self.len = block.len();
            self.resolution = block.resolution();
        }
    }

    fn state(level: u8, mute: bool) -> DeviceControlState {
        DeviceControlState::new(
            &SpeakerConfig::new()
                .with_initial_system_volume(level)
                .with_initial_mute(mute),
        )
    }

    #[test]
    fn from_bytes_copies_packet() {
        let block = AudioBlock::from_bytes(&[1, 2, 3, 4, 5], 24).unwrap();
        assert_eq!(block.as_bytes(), &[1, 2, 3, 4, 5]);
        assert_eq!(block.len(), 5);
        assert_eq!(block.resolution(), 24);
        assert_eq!(block.subslot_size(), 4);
    }

    #[test]
    fn oversized_packet_rejected() {
        let big = [0u8; AUDIO_BLOCK_BYTES + 1];
        assert!(matches!(
            AudioBlock::from_bytes(&big, 16),
            Err(ControlError::Validation { what: "audio packet size", .. })
        ));
        assert!(AudioBlock::from_bytes(&big[..AUDIO_BLOCK_BYTES], 16).is_ok());
    }

    #[test]
    fn alt_setting_resolution() {
        assert_eq!(resolution_for_alt(0), None);
        assert_eq!(resolution_for_alt(1), Some(16));
        assert_eq!(resolution_for_alt(2), Some(24));
        assert_eq!(resolution_for_alt(3), None);
    }

    #[test]
    fn forwards_ramp_gain() {
        let mut gate = AudioGate::new();
        let mut sink = LastGain::default();
        let block = AudioBlock::from_bytes(&[0; 192], 16).unwrap();

        let gain = gate.process(block, &state(192, false), &mut sink);

        assert_eq!(gain, 81);
        assert_eq!(sink.gain, Some(81));
        assert_eq!(sink.len, 192);
        assert_eq!(sink.resolution, 16);
        assert_eq!(gate.forwarded(), 1);
    }

    #[test]
    fn mute_forces_zero_gain() {
        let mut gate = AudioGate::new();
        let mut sink = LastGain::default();
        gate.process(AudioBlock::new(16), &state(255, true), &mut sink);
        assert_eq!(sink.gain, Some(0));
    }

    #[test]
    fn full_knob_is_unity() {
        let s = state(255, false);
        assert_eq!(AudioGate::current_gain(&s), 255);
    }
}
