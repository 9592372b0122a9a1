//! Error taxonomy for the control surface.

/// Non-returning reboot flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootMode {
    /// Watchdog reset back into the application.
    Reset,
    /// Reset into the USB mass-storage bootloader.
    Bootloader,
}

/// Everything the core can reject or give up on.
///
/// GET/SET rejections are reported to the host by the transport as a stalled
/// control transfer; the core never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// Malformed SET payload, channel out of range or oversized audio packet.
    #[error("invalid {what}: expected {expected}, got {actual}")]
    Validation {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Unknown entity, selector or request kind combination.
    #[error("unsupported request: entity {entity:#04x}, selector {selector:#04x}, request {kind:#04x}")]
    Unsupported { entity: u8, selector: u8, kind: u8 },

    /// Bounded command-channel wait ran out.
    #[error("command channel timed out")]
    Timeout,

    /// Explicit reboot trigger; the caller must not resume the loop.
    #[error("reboot requested: {0:?}")]
    FatalReset(RebootMode),
}

impl ControlError {
    pub(crate) const fn payload_len(expected: usize, actual: usize) -> Self {
        ControlError::Validation {
            what: "payload length",
            expected,
            actual,
        }
    }
}
