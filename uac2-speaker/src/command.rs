//! Serial command channel.
//!
//! A host tool can reboot the device over the CDC serial port by writing
//! `multiverse:` followed by a 4-byte token. The parser runs one step per
//! loop iteration and never blocks: it consumes what the port has and keeps
//! its place between polls.
//!
//! | Token | Effect |
//! |-------|--------|
//! | `_rst` | watchdog reset |
//! | `_usb` | reset into the USB bootloader |
//!
//! Any other token is ignored.

use crate::config::SpeakerConfig;
use crate::constants::{COMMAND_PREAMBLE, COMMAND_TOKEN_BOOTLOADER, COMMAND_TOKEN_LEN, COMMAND_TOKEN_RESET};
use crate::error::{ControlError, RebootMode};

/// Upper bound on bytes consumed by a single [`CommandChannel::poll`].
pub const MAX_BYTES_PER_POLL: usize = 64;

/// Byte-stream side of the CDC interface.
pub trait SerialPort {
    /// A terminal has the port open.
    fn connected(&self) -> bool;

    /// Non-blocking read. Returns the number of bytes written to `buf`.
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Preamble { matched: usize, started_ms: u32 },
    Token { got: usize, started_ms: u32 },
}

/// Watches the serial port for `multiverse:` followed by a reboot token.
pub struct CommandChannel {
    phase: Phase,
    token: [u8; COMMAND_TOKEN_LEN],
    preamble_timeout_ms: u32,
    token_timeout_ms: u32,
}

impl CommandChannel {
    pub fn new(config: &SpeakerConfig) -> Self {
        CommandChannel {
            phase: Phase::Idle,
            token: [0; COMMAND_TOKEN_LEN],
            preamble_timeout_ms: config.preamble_timeout_ms,
            token_timeout_ms: config.token_timeout_ms,
        }
    }

    /// Somewhere between the first preamble byte and the last token byte.
    pub fn in_progress(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Consume available bytes and advance the parser.
    ///
    /// Returns [`ControlError::FatalReset`] for a reboot token and
    /// [`ControlError::Timeout`] once when a started command stalls. The
    /// parser is back to idle after either.
    pub fn poll<P: SerialPort>(&mut self, now_ms: u32, port: &mut P) -> Result<(), ControlError> {
        if !port.connected() {
            self.reset();
            return Ok(());
        }

        for _ in 0..MAX_BYTES_PER_POLL {
            self.check_deadline(now_ms)?;
            let mut byte = [0u8; 1];
            if port.read(&mut byte) == 0 {
                break;
            }
            self.feed(now_ms, byte[0])?;
        }

        self.check_deadline(now_ms)
    }

    fn check_deadline(&mut self, now_ms: u32) -> Result<(), ControlError> {
        let (started_ms, window_ms) = match self.phase {
            Phase::Idle => return Ok(()),
            Phase::Preamble { started_ms, .. } => (started_ms, self.preamble_timeout_ms),
            Phase::Token { started_ms, .. } => (started_ms, self.token_timeout_ms),
        };
        if now_ms.wrapping_sub(started_ms) > window_ms {
            log::debug!("Command timed out in {:?}", self.phase);
            self.reset();
            return Err(ControlError::Timeout);
        }
        Ok(())
    }

    fn feed(&mut self, now_ms: u32, byte: u8) -> Result<(), ControlError> {
        match self.phase {
            Phase::Idle => {
                if byte == COMMAND_PREAMBLE[0] {
                    self.phase = Phase::Preamble { matched: 1, started_ms: now_ms };
                    self.preamble_step(now_ms);
                }
            }
            Phase::Preamble { matched, started_ms } => {
                if byte == COMMAND_PREAMBLE[matched] {
                    self.phase = Phase::Preamble { matched: matched + 1, started_ms };
                    self.preamble_step(now_ms);
                } else {
                    self.reset();
                }
            }
            Phase::Token { got, started_ms } => {
                self.token[got] = byte;
                if got + 1 < COMMAND_TOKEN_LEN {
                    self.phase = Phase::Token { got: got + 1, started_ms };
                } else {
                    self.reset();
                    return self.dispatch();
                }
            }
        }
        Ok(())
    }

    /// Switch to the token phase once the whole preamble matched.
    fn preamble_step(&mut self, now_ms: u32) {
        if let Phase::Preamble { matched, .. } = self.phase {
            if matched == COMMAND_PREAMBLE.len() {
                self.phase = Phase::Token { got: 0, started_ms: now_ms };
            }
        }
    }

    fn dispatch(&self) -> Result<(), ControlError> {
        let mode = match self.token {
            COMMAND_TOKEN_RESET => RebootMode::Reset,
            COMMAND_TOKEN_BOOTLOADER => RebootMode::Bootloader,
            other => {
                log::debug!("Ignoring command token {:?}", other);
                return Ok(());
            }
        };
        log::warn!("Serial command requested {:?}", mode);
        Err(ControlError::FatalReset(mode))
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Port {
        data: Vec<u8>,
        pos: usize,
        connected: bool,
    }

    impl Port {
        fn new(data: &[u8]) -> Self {
            Port { data: data.to_vec(), pos: 0, connected: true }
        }

        fn push(&mut self, data: &[u8]) {
            self.data.extend_from_slice(data);
        }

        fn remaining(&self) -> usize {
            self.data.len() - self.pos
        }
    }

    impl SerialPort for Port {
        fn connected(&self) -> bool {
            self.connected
        }

        fn read(&mut self, buf: &mut [u8]) -> usize {
            let n = buf.len().min(self.remaining());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            n
        }
    }

    fn channel() -> CommandChannel {
        CommandChannel::new(&SpeakerConfig::default())
    }

    #[test]
    fn reset_token() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse:_rst");
        assert_eq!(cmd.poll(0, &mut port), Err(ControlError::FatalReset(RebootMode::Reset)));
        assert!(!cmd.in_progress());
    }

    #[test]
    fn bootloader_token() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse:_usb");
        assert_eq!(
            cmd.poll(0, &mut port),
            Err(ControlError::FatalReset(RebootMode::Bootloader))
        );
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse:nope");
        assert_eq!(cmd.poll(0, &mut port), Ok(()));
        assert!(!cmd.in_progress());
    }

    #[test]
    fn mismatch_aborts_silently() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverze:_rst");
        assert_eq!(cmd.poll(0, &mut port), Ok(()));
        assert!(!cmd.in_progress());
        assert_eq!(port.remaining(), 0);
    }

    #[test]
    fn split_across_polls() {
        let mut cmd = channel();
        let mut port = Port::new(b"multi");
        assert_eq!(cmd.poll(0, &mut port), Ok(()));
        assert!(cmd.in_progress());

        port.push(b"verse:_u");
        assert_eq!(cmd.poll(20, &mut port), Ok(()));

        port.push(b"sb");
        assert_eq!(
            cmd.poll(900, &mut port),
            Err(ControlError::FatalReset(RebootMode::Bootloader))
        );
    }

    #[test]
    fn slow_preamble_times_out_once() {
        let mut cmd = channel();
        let mut port = Port::new(b"multi");
        cmd.poll(0, &mut port).unwrap();

        assert_eq!(cmd.poll(51, &mut port), Err(ControlError::Timeout));
        assert!(!cmd.in_progress());
        assert_eq!(cmd.poll(52, &mut port), Ok(()));
    }

    #[test]
    fn late_byte_starts_fresh() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse");
        cmd.poll(0, &mut port).unwrap();

        // the ':' turns up after the preamble window closed
        port.push(b":_rst");
        assert_eq!(cmd.poll(60, &mut port), Err(ControlError::Timeout));
        assert_eq!(port.remaining(), 5);
        assert_eq!(cmd.poll(61, &mut port), Ok(()));
        assert!(!cmd.in_progress());
    }

    #[test]
    fn token_window_is_separate() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse:_r");
        cmd.poll(40, &mut port).unwrap();

        assert_eq!(cmd.poll(1000, &mut port), Ok(()));
        assert_eq!(cmd.poll(1041, &mut port), Err(ControlError::Timeout));
    }

    #[test]
    fn disconnect_resets() {
        let mut cmd = channel();
        let mut port = Port::new(b"multiverse:");
        cmd.poll(0, &mut port).unwrap();
        assert!(cmd.in_progress());

        port.connected = false;
        port.push(b"_rst");
        assert_eq!(cmd.poll(1, &mut port), Ok(()));
        assert!(!cmd.in_progress());
        assert_eq!(port.remaining(), 4);
    }

    #[test]
    fn read_is_bounded_per_poll() {
        let mut cmd = channel();
        let noise = [b'x'; MAX_BYTES_PER_POLL + 10];
        let mut port = Port::new(&noise);
        cmd.poll(0, &mut port).unwrap();
        assert_eq!(port.remaining(), 10);
    }

    #[test]
    fn noise_then_command() {
        let mut cmd = channel();
        let mut port = Port::new(b"xxmultiverse:_rst");
        assert_eq!(cmd.poll(0, &mut port), Err(ControlError::FatalReset(RebootMode::Reset)));
    }
}
