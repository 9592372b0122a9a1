//! Entity control requests and their wire encodings.
//!
//! A [`ControlRequest`] is what the transport hands over for every
//! class-specific GET or SET addressed to an entity. [`ControlRequest::target`]
//! turns the raw (entity, selector, request) triple into a [`ControlTarget`],
//! validating the channel number on the way, so the handler can match
//! exhaustively. [`Response`] holds the little-endian payload of a GET.

use crate::constants::{
    CS_CLK_VALID, CS_SAM_FREQ, ENTITY_CLOCK, ENTITY_SPK_FEATURE_UNIT, FU_MUTE, FU_VOLUME,
    REQ_CUR, REQ_RANGE,
};
use crate::error::ControlError;
use crate::state::Channel;

/// Request attribute: current value or range of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Cur,
    Range,
}

impl RequestKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            REQ_CUR => Some(RequestKind::Cur),
            REQ_RANGE => Some(RequestKind::Range),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RequestKind::Cur => REQ_CUR,
            RequestKind::Range => REQ_RANGE,
        }
    }
}

/// One class-specific entity request. Lives only for the duration of the
/// control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest<'a> {
    pub entity_id: u8,
    pub selector: u8,
    /// Raw `bRequest`; see [`RequestKind`].
    pub request: u8,
    pub channel: u8,
    /// Data stage of a SET; empty for a GET.
    pub payload: &'a [u8],
}

impl<'a> ControlRequest<'a> {
    pub fn new(entity_id: u8, selector: u8, kind: RequestKind, channel: u8, payload: &'a [u8]) -> Self {
        ControlRequest {
            entity_id,
            selector,
            request: kind.code(),
            channel,
            payload,
        }
    }

    /// Build from the setup packet fields.
    ///
    /// `wValue` carries the control selector in its high byte and the channel
    /// number in its low byte; `wIndex` carries the entity ID in its high byte.
    pub fn from_setup(b_request: u8, w_value: u16, w_index: u16, payload: &'a [u8]) -> Self {
        ControlRequest {
            entity_id: (w_index >> 8) as u8,
            selector: (w_value >> 8) as u8,
            request: b_request,
            channel: w_value as u8,
            payload,
        }
    }

    /// The same request without its data stage, detached from the
    /// transport's receive buffer.
    pub fn header(&self) -> ControlRequest<'static> {
        ControlRequest {
            entity_id: self.entity_id,
            selector: self.selector,
            request: self.request,
            channel: self.channel,
            payload: &[],
        }
    }

    pub fn kind(&self) -> Option<RequestKind> {
        RequestKind::from_code(self.request)
    }

    /// The rejection for a request the speaker has no handler for.
    pub(crate) fn unsupported(&self) -> ControlError {
        ControlError::Unsupported {
            entity: self.entity_id,
            selector: self.selector,
            kind: self.request,
        }
    }

    /// Classify the request. Feature-unit targets carry a validated channel.
    pub fn target(&self) -> Result<ControlTarget, ControlError> {
        use RequestKind::{Cur, Range};

        let target = match (self.entity_id, self.selector, self.kind()) {
            (ENTITY_CLOCK, CS_SAM_FREQ, Some(Cur)) => ControlTarget::ClockCurRate,
            (ENTITY_CLOCK, CS_SAM_FREQ, Some(Range)) => ControlTarget::ClockRangeRate,
            (ENTITY_CLOCK, CS_CLK_VALID, Some(Cur)) => ControlTarget::ClockValid,
            (ENTITY_SPK_FEATURE_UNIT, FU_MUTE, Some(Cur)) => {
                ControlTarget::FeatureMute(Channel::new(self.channel)?)
            }
            (ENTITY_SPK_FEATURE_UNIT, FU_VOLUME, Some(Cur)) => {
                ControlTarget::FeatureVolumeCur(Channel::new(self.channel)?)
            }
            (ENTITY_SPK_FEATURE_UNIT, FU_VOLUME, Some(Range)) => {
                ControlTarget::FeatureVolumeRange(Channel::new(self.channel)?)
            }
            _ => ControlTarget::Unsupported,
        };
        Ok(target)
    }

    /// Check the data stage is exactly `N` bytes and return it.
    pub(crate) fn payload_exact<const N: usize>(&self) -> Result<[u8; N], ControlError> {
        self.payload
            .try_into()
            .map_err(|_| ControlError::payload_len(N, self.payload.len()))
    }
}

/// Every control the speaker understands, plus a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTarget {
    ClockCurRate,
    ClockRangeRate,
    ClockValid,
    FeatureMute(Channel),
    FeatureVolumeCur(Channel),
    FeatureVolumeRange(Channel),
    Unsupported,
}

/// Largest GET payload: a one-entry 4-byte range (2 + 3 × 4 bytes).
pub const MAX_RESPONSE_LEN: usize = 14;

/// Little-endian data stage of a GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    buf: [u8; MAX_RESPONSE_LEN],
    len: usize,
}

impl Response {
    fn from_slice(bytes: &[u8]) -> Self {
        let mut buf = [0u8; MAX_RESPONSE_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Response {
            buf,
            len: bytes.len(),
        }
    }

    /// 1-byte CUR layout.
    pub fn cur1(value: u8) -> Self {
        Self::from_slice(&[value])
    }

    /// 2-byte CUR layout.
    pub fn cur2(value: i16) -> Self {
        Self::from_slice(&value.to_le_bytes())
    }

    /// 4-byte CUR layout.
    pub fn cur4(value: u32) -> Self {
        Self::from_slice(&value.to_le_bytes())
    }

    /// 2-byte RANGE layout with a single sub-range.
    pub fn range2(min: i16, max: i16, res: i16) -> Self {
        let mut buf = [0u8; 8];
        buf[0..2].copy_from_slice(&1u16.to_le_bytes());
        buf[2..4].copy_from_slice(&min.to_le_bytes());
        buf[4..6].copy_from_slice(&max.to_le_bytes());
        buf[6..8].copy_from_slice(&res.to_le_bytes());
        Self::from_slice(&buf)
    }

    /// 4-byte RANGE layout with a single sub-range.
    pub fn range4(min: u32, max: u32, res: u32) -> Self {
        let mut buf = [0u8; 14];
        buf[0..2].copy_from_slice(&1u16.to_le_bytes());
        buf[2..6].copy_from_slice(&min.to_le_bytes());
        buf[6..10].copy_from_slice(&max.to_le_bytes());
        buf[10..14].copy_from_slice(&res.to_le_bytes());
        Self::from_slice(&buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(entity: u8, selector: u8, kind: RequestKind, channel: u8) -> ControlRequest<'static> {
        ControlRequest::new(entity, selector, kind, channel, &[])
    }

    #[test]
    fn from_setup_splits_fields() {
        let req = ControlRequest::from_setup(REQ_CUR, 0x0201, 0x0200, &[]);
        assert_eq!(req.entity_id, ENTITY_SPK_FEATURE_UNIT);
        assert_eq!(req.selector, FU_VOLUME);
        assert_eq!(req.channel, 1);
        assert_eq!(req.kind(), Some(RequestKind::Cur));
    }

    #[test]
    fn classifies_clock_controls() {
        use RequestKind::*;
        assert_eq!(get(ENTITY_CLOCK, CS_SAM_FREQ, Cur, 0).target(), Ok(ControlTarget::ClockCurRate));
        assert_eq!(get(ENTITY_CLOCK, CS_SAM_FREQ, Range, 0).target(), Ok(ControlTarget::ClockRangeRate));
        assert_eq!(get(ENTITY_CLOCK, CS_CLK_VALID, Cur, 0).target(), Ok(ControlTarget::ClockValid));
        assert_eq!(get(ENTITY_CLOCK, CS_CLK_VALID, Range, 0).target(), Ok(ControlTarget::Unsupported));
    }

    #[test]
    fn clock_ignores_channel() {
        let req = get(ENTITY_CLOCK, CS_SAM_FREQ, RequestKind::Cur, 200);
        assert_eq!(req.target(), Ok(ControlTarget::ClockCurRate));
    }

    #[test]
    fn classifies_feature_controls() {
        use RequestKind::*;
        let fu = ENTITY_SPK_FEATURE_UNIT;
        assert_eq!(get(fu, FU_MUTE, Cur, 0).target(), Ok(ControlTarget::FeatureMute(Channel::MASTER)));
        assert_eq!(get(fu, FU_VOLUME, Cur, 2).target(), Ok(ControlTarget::FeatureVolumeCur(Channel::RIGHT)));
        assert_eq!(get(fu, FU_VOLUME, Range, 1).target(), Ok(ControlTarget::FeatureVolumeRange(Channel::LEFT)));
        assert_eq!(get(fu, FU_MUTE, Range, 0).target(), Ok(ControlTarget::Unsupported));
        assert_eq!(get(fu, 0x07, Cur, 0).target(), Ok(ControlTarget::Unsupported));
    }

    #[test]
    fn rejects_bad_channel() {
        let req = get(ENTITY_SPK_FEATURE_UNIT, FU_MUTE, RequestKind::Cur, 3);
        assert!(matches!(req.target(), Err(ControlError::Validation { .. })));
    }

    #[test]
    fn unknown_entity_and_kind() {
        let req = get(0x33, FU_MUTE, RequestKind::Cur, 0);
        assert_eq!(req.target(), Ok(ControlTarget::Unsupported));

        let req = ControlRequest::from_setup(0x03, 0x0100, 0x0200, &[]);
        assert_eq!(req.kind(), None);
        assert_eq!(req.target(), Ok(ControlTarget::Unsupported));
    }

    #[test]
    fn payload_exact_checks_length() {
        let data = [1u8, 2];
        let req = ControlRequest::new(ENTITY_SPK_FEATURE_UNIT, FU_VOLUME, RequestKind::Cur, 0, &data);
        assert_eq!(req.payload_exact::<2>(), Ok([1, 2]));
        assert_eq!(req.payload_exact::<1>(), Err(ControlError::payload_len(1, 2)));
        assert_eq!(req.payload_exact::<4>(), Err(ControlError::payload_len(4, 2)));
    }

    #[test]
    fn response_layouts() {
        assert_eq!(Response::cur1(1).as_bytes(), &[1]);
        assert_eq!(Response::cur2(-256).as_bytes(), &[0x00, 0xFF]);
        assert_eq!(Response::cur4(48_000).as_bytes(), &[0x80, 0xBB, 0x00, 0x00]);
        assert_eq!(
            Response::range2(0, 25_600, 256).as_bytes(),
            &[0x01, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x01]
        );
        let r = Response::range4(48_000, 48_000, 0);
        assert_eq!(r.len(), 14);
        assert_eq!(&r.as_bytes()[..2], &[0x01, 0x00]);
        assert_eq!(&r.as_bytes()[2..6], &48_000u32.to_le_bytes());
        assert_eq!(&r.as_bytes()[6..10], &48_000u32.to_le_bytes());
        assert_eq!(&r.as_bytes()[10..14], &[0, 0, 0, 0]);
    }
}
