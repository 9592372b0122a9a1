//! Collaborator traits for everything outside the core.
//!
//! The USB device stack implements [`Transport`]. Each loop iteration
//! [`Speaker::poll`](crate::speaker::Speaker::poll) runs the stack once and
//! then drains whatever it produced through [`Transport::next_event`]. Stacks
//! that can only push callbacks may instead forward them to the `on_*`
//! methods of [`Speaker`](crate::speaker::Speaker). The board implements
//! [`Platform`].

use crate::error::RebootMode;
use crate::notify::InterruptNotification;
use crate::request::ControlRequest;

/// Something the device stack saw since the last loop iteration.
///
/// Borrowed data (request payloads, audio packets) stays in the stack's
/// buffers and is only valid until the next call into the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbEvent<'a> {
    Mount,
    Unmount,
    Suspend,
    Resume,
    /// SET_INTERFACE on any interface.
    SetInterface { interface: u8, alt: u8 },
    /// Class-specific GET addressed to an entity.
    GetEntity(ControlRequest<'a>),
    /// Class-specific SET addressed to an entity, data stage included.
    SetEntity(ControlRequest<'a>),
    /// One speaker packet from the isochronous OUT endpoint.
    AudioReceived(&'a [u8]),
}

/// USB device stack as seen from the control surface.
///
/// Every [`UsbEvent::GetEntity`] and [`UsbEvent::SetEntity`] is completed by
/// exactly one call to [`answer`](Transport::answer) or
/// [`stall`](Transport::stall) before the next event is taken.
pub trait Transport {
    /// Complete the outstanding request: the data stage of a GET, or with an
    /// empty payload the status stage of a SET. Returns `false` if the stack
    /// refused it, in which case the host sees a stall.
    fn answer(&mut self, request: &ControlRequest, payload: &[u8]) -> bool;

    /// Stall the outstanding control request.
    fn stall(&mut self);

    /// Send one interrupt data message. Not acknowledged; lost if the host is
    /// not polling the endpoint.
    fn deliver_interrupt(&mut self, notification: &InterruptNotification);

    /// Run the device stack once (the equivalent of `tud_task`).
    fn poll_once(&mut self);

    /// Take the next event produced by [`poll_once`](Transport::poll_once).
    fn next_event(&mut self) -> Option<UsbEvent<'_>>;

    fn is_mounted(&self) -> bool;

    fn is_suspended(&self) -> bool;

    /// Current alternate setting of `interface`.
    fn alt_setting(&self, interface: u8) -> u8;
}

/// Board services.
pub trait Platform {
    /// Monotonic milliseconds since boot. Wraps.
    fn now_ms(&self) -> u32;

    /// Reset the chip. Never returns.
    fn reboot(&mut self, mode: RebootMode) -> !;
}
