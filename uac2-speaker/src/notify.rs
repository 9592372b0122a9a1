//! Host notifications.
//!
//! When the device changes a feature-unit control on its own, it tells the
//! host with a 6-byte interrupt data message on the audio interrupt endpoint.
//! The host then re-reads the control with a GET. Messages are queued in an
//! [`Outbox`] and handed to the transport by the scheduler once per loop,
//! each followed by a transport poll so it goes out while the host is still
//! polling the endpoint. There is no acknowledgement and no resend.

use crate::constants::{ENTITY_SPK_FEATURE_UNIT, FU_MUTE, FU_VOLUME, INTERRUPT_MESSAGE_LEN, REQ_CUR};

/// One pending "control changed" message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptNotification {
    pub entity_id: u8,
    pub selector: u8,
    pub channel: u8,
}

impl InterruptNotification {
    /// Master-channel mute changed.
    pub const fn mute() -> Self {
        InterruptNotification {
            entity_id: ENTITY_SPK_FEATURE_UNIT,
            selector: FU_MUTE,
            channel: 0,
        }
    }

    /// Master-channel volume changed.
    pub const fn volume() -> Self {
        InterruptNotification {
            entity_id: ENTITY_SPK_FEATURE_UNIT,
            selector: FU_VOLUME,
            channel: 0,
        }
    }

    /// Interrupt data message layout:
    ///
    /// | byte | field | value |
    /// |------|-------|-------|
    /// | 0 | bInfo | 0 (class-specific, from an interface) |
    /// | 1 | bAttribute | CUR |
    /// | 2 | wValue CN/MCN | channel |
    /// | 3 | wValue CS | selector |
    /// | 4 | wIndex EP/interface | 0 |
    /// | 5 | wIndex entity | entity ID |
    pub fn to_bytes(&self) -> [u8; INTERRUPT_MESSAGE_LEN] {
        [0, REQ_CUR, self.channel, self.selector, 0, self.entity_id]
    }
}

/// Fixed-capacity FIFO of notifications waiting for the transport.
///
/// Usable capacity is `N - 1`; one slot separates full from empty. Pushing
/// into a full outbox hands the notification back to the caller.
pub struct Outbox<const N: usize> {
    slots: [InterruptNotification; N],
    /// Next slot to write.
    head: usize,
    /// Next slot to read.
    tail: usize,
}

impl<const N: usize> Outbox<N> {
    pub const fn new() -> Self {
        assert!(N >= 2, "outbox needs at least 2 slots (1 usable)");
        Outbox {
            slots: [InterruptNotification::mute(); N],
            head: 0,
            tail: 0,
        }
    }

    /// Append at the tail. A full outbox hands the notification back.
    pub fn push(&mut self, notification: InterruptNotification) -> Result<(), InterruptNotification> {
        let next_head = (self.head + 1) % N;
        if next_head == self.tail {
            return Err(notification);
        }
        self.slots[self.head] = notification;
        self.head = next_head;
        Ok(())
    }

    /// Take the oldest notification.
    pub fn pop(&mut self) -> Option<InterruptNotification> {
        if self.tail == self.head {
            return None;
        }
        let n = self.slots[self.tail];
        self.tail = (self.tail + 1) % N;
        Some(n)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }
}

impl<const N: usize> Default for Outbox<N> {
    fn default() -> Self {
        Self::new()
    }
}
