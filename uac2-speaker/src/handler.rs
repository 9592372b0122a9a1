//! Control surface entity handler.
//!
//! Answers the host's class-specific GET and SET requests for the clock
//! source and the speaker feature unit against [`DeviceControlState`].
//!
//! | Target | GET CUR | GET RANGE | SET CUR |
//! |--------|---------|-----------|---------|
//! | Clock sample rate | stored rate (4 B) | (48000, 48000, 0) | store, 4 B payload |
//! | Clock valid | 1 (1 B) | - | - |
//! | FU mute | channel bit (1 B) | - | store, 1 B payload |
//! | FU volume | channel value (2 B) | (0, 100 dB, 1 dB) | store + mirror to knob, 2 B payload |
//!
//! Everything else is [`ControlError::Unsupported`]. A SET that changes a
//! feature-unit value returns the matching [`InterruptNotification`] for the
//! caller to queue.

use crate::constants::{SAMPLE_RATES, VOLUME_MAX, VOLUME_MIN, VOLUME_ONE_DB};
use crate::error::ControlError;
use crate::notify::InterruptNotification;
use crate::request::{ControlRequest, ControlTarget, RequestKind, Response};
use crate::state::DeviceControlState;

/// Serve a GET.
pub fn get_entity(state: &DeviceControlState, request: &ControlRequest) -> Result<Response, ControlError> {
    let response = match request.target()? {
        ControlTarget::ClockCurRate => {
            log::debug!("Clock get current freq {}", state.sample_rate());
            Response::cur4(state.sample_rate())
        }
        ControlTarget::ClockRangeRate => {
            let rate = SAMPLE_RATES[0];
            log::debug!("Clock get freq range ({}, {}, 0)", rate, rate);
            Response::range4(rate, rate, 0)
        }
        ControlTarget::ClockValid => {
            log::debug!("Clock get is valid 1");
            Response::cur1(1)
        }
        ControlTarget::FeatureMute(channel) => {
            let mute = state.mute(channel);
            log::debug!("Get channel {} mute {}", channel.number(), mute);
            Response::cur1(mute as u8)
        }
        ControlTarget::FeatureVolumeCur(channel) => {
            let volume = state.volume(channel);
            log::debug!("Get channel {} volume {} dB", channel.number(), volume / VOLUME_ONE_DB);
            Response::cur2(volume)
        }
        ControlTarget::FeatureVolumeRange(channel) => {
            log::debug!(
                "Get channel {} volume range ({}, {}, 1) dB",
                channel.number(),
                VOLUME_MIN / VOLUME_ONE_DB,
                VOLUME_MAX / VOLUME_ONE_DB
            );
            Response::range2(VOLUME_MIN, VOLUME_MAX, VOLUME_ONE_DB)
        }
        ControlTarget::Unsupported => return Err(request.unsupported()),
    };
    Ok(response)
}

/// Serve a SET. Only CUR requests carry a settable value.
///
/// On error the state is left untouched.
pub fn set_entity(
    state: &mut DeviceControlState,
    request: &ControlRequest,
) -> Result<Option<InterruptNotification>, ControlError> {
    if request.kind() != Some(RequestKind::Cur) {
        return Err(request.unsupported());
    }

    match request.target()? {
        ControlTarget::ClockCurRate => {
            let hz = u32::from_le_bytes(request.payload_exact::<4>()?);
            if !SAMPLE_RATES.contains(&hz) {
                log::warn!("Clock set to unsupported freq {}, storing anyway", hz);
            }
            state.set_sample_rate(hz);
            log::debug!("Clock set current freq: {}", hz);
            Ok(None)
        }
        ControlTarget::FeatureMute(channel) => {
            let [cur] = request.payload_exact::<1>()?;
            let changed = state.set_mute(channel, cur != 0);
            log::debug!("Set channel {} mute: {}", channel.number(), cur != 0);
            Ok(changed.then(InterruptNotification::mute))
        }
        ControlTarget::FeatureVolumeCur(channel) => {
            let volume = i16::from_le_bytes(request.payload_exact::<2>()?);
            let changed = state.set_volume(channel, volume);
            log::debug!("Set channel {} volume: {} dB", channel.number(), volume / VOLUME_ONE_DB);
            Ok(changed.then(InterruptNotification::volume))
        }
        ControlTarget::ClockRangeRate
        | ControlTarget::ClockValid
        | ControlTarget::FeatureVolumeRange(_)
        | ControlTarget::Unsupported => Err(request.unsupported()),
    }
}
