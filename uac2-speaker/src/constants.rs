//! Wire-level constants for the speaker function.
//!
//! Entity IDs match the configuration descriptor; selectors and request codes
//! are the UAC2 values.

/// Clock source entity.
pub const ENTITY_CLOCK: u8 = 0x04;

/// Speaker feature unit (mute + volume).
pub const ENTITY_SPK_FEATURE_UNIT: u8 = 0x02;

/// Speaker-path output terminal.
pub const ENTITY_SPK_OUTPUT_TERMINAL: u8 = 0x03;

/// Request code: current setting.
pub const REQ_CUR: u8 = 0x01;

/// Request code: range of settings.
pub const REQ_RANGE: u8 = 0x02;

/// Clock source control: sampling frequency.
pub const CS_SAM_FREQ: u8 = 0x01;

/// Clock source control: clock validity.
pub const CS_CLK_VALID: u8 = 0x02;

/// Feature unit control: mute.
pub const FU_MUTE: u8 = 0x01;

/// Feature unit control: volume.
pub const FU_VOLUME: u8 = 0x02;

/// The only sample rate the device runs at, in Hz.
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Supported sample rates, advertised through the clock RANGE request.
pub const SAMPLE_RATES: [u32; 1] = [SAMPLE_RATE_HZ];

/// Number of received channels (stereo). Channel 0 is the master on top.
pub const N_CHANNELS_RX: usize = 2;

/// Number of addressable feature-unit channels, master included.
pub const N_CONTROL_CHANNELS: usize = N_CHANNELS_RX + 1;

/// Volume of 1 dB in the 1/256 dB fixed-point wire format.
pub const VOLUME_ONE_DB: i16 = 256;

/// Lowest advertised volume (0 dB).
pub const VOLUME_MIN: i16 = 0;

/// Highest advertised volume (100 dB).
pub const VOLUME_MAX: i16 = 100 * VOLUME_ONE_DB;

/// Scale between the local 0–255 knob and the feature-unit volume value.
pub const VOLUME_KNOB_SCALE: i32 = 100;

/// Interface number of the speaker streaming interface.
pub const ITF_NUM_AUDIO_STREAMING_SPK: u8 = 1;

/// Bit resolution per streaming format; alt setting `n` selects entry `n - 1`.
pub const RESOLUTIONS_PER_FORMAT: [u8; 2] = [16, 24];

/// Capacity of the speaker software buffer, in bytes.
pub const AUDIO_BLOCK_BYTES: usize = 1536;

/// Size of an interrupt data message on the wire.
pub const INTERRUPT_MESSAGE_LEN: usize = 6;

/// Heartbeat period while audio is streaming.
pub const BLINK_STREAMING_MS: u32 = 25;

/// Heartbeat period while the device is not mounted.
pub const BLINK_NOT_MOUNTED_MS: u32 = 250;

/// Heartbeat period while mounted but idle.
pub const BLINK_MOUNTED_MS: u32 = 1000;

/// Heartbeat period while the bus is suspended.
pub const BLINK_SUSPENDED_MS: u32 = 2500;

/// Literal preamble that opens a command on the serial channel.
pub const COMMAND_PREAMBLE: &[u8] = b"multiverse:";

/// Length of the token that follows the preamble.
pub const COMMAND_TOKEN_LEN: usize = 4;

/// Token requesting a plain watchdog reset.
pub const COMMAND_TOKEN_RESET: [u8; COMMAND_TOKEN_LEN] = *b"_rst";

/// Token requesting a reboot into the USB bootloader.
pub const COMMAND_TOKEN_BOOTLOADER: [u8; COMMAND_TOKEN_LEN] = *b"_usb";
