//! # uac2-speaker
//!
//! A `no_std`, allocation-free control surface for a USB Audio Class 2.0
//! speaker. It answers the host's clock and feature-unit requests, folds a
//! rotary encoder and a mute button into the same control state, scales the
//! speaker stream along a perceptual volume curve and tells the host when the
//! device changed a control on its own.
//!
//! The USB stack, the I2S output, the input debouncing and the LED PWM live
//! outside the crate behind small traits.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | State | [`state`] | Per-channel mute/volume, the 0–255 knob, LED levels |
//! | Wire | [`request`] / [`notify`] | GET/SET parsing, responses, interrupt messages |
//! | Logic | [`handler`] | Clock and feature-unit GET/SET |
//! | Logic | [`input`] | 50 ms encoder/button reconciler |
//! | Audio | [`ramp`] / [`gate`] / [`dsp`] | Volume curve, per-block gain, software scaling |
//! | Misc | [`status`] / [`command`] | RGB status LED, serial reboot commands |
//! | Loop | [`speaker`] / [`transport`] | Cooperative scheduler and collaborator traits |
//!
//! ## Quick start
//!
//! ```ignore
//! use uac2_speaker::config::SpeakerConfig;
//! use uac2_speaker::speaker::{Board, Speaker};
//!
//! let board = Board { transport: usb, input: knob, sink: i2s, led, serial: cdc };
//! let speaker = Speaker::new(SpeakerConfig::default(), board);
//!
//! // never returns; reboots through the platform on request
//! speaker.run(&mut platform);
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `pwm-indicator` | yes | [`status::PwmRgb`], an `embedded-hal` PWM backend for the LED |
//!
//! ## Device parameters
//!
//! - **Sample rate:** 48 kHz only ([`constants::SAMPLE_RATE_HZ`])
//! - **Channels:** master + 2 ([`constants::N_CONTROL_CHANNELS`])
//! - **Formats:** 16-bit (alt 1) and 24-bit (alt 2)
//! - **Volume:** 0 to 100 dB in 1 dB steps, 1/256 dB units on the wire

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod config;
pub mod error;
pub mod ramp;
pub mod state;
pub mod request;
pub mod notify;
pub mod handler;
pub mod timer;
pub mod input;
pub mod dsp;
pub mod gate;
pub mod status;
pub mod command;
pub mod transport;
pub mod speaker;
