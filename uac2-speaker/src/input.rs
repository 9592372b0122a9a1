//! Local input reconciler.
//!
//! Folds the rotary encoder and the mute button into [`DeviceControlState`]
//! on a fixed 50 ms schedule. Each tick runs, in order:
//!
//! 1. take the accumulated encoder delta and scale it by the configured speed,
//! 2. if the button is being held, request a reboot into the bootloader,
//! 3. if the button was pressed, toggle master mute (left follows) and queue a
//!    MUTE notification,
//! 4. move the knob by the delta, saturating at 0 and 255; if it moved,
//!    queue a VOLUME notification.

use crate::config::SpeakerConfig;
use crate::error::{ControlError, RebootMode};
use crate::notify::{InterruptNotification, Outbox};
use crate::state::DeviceControlState;
use crate::timer::Interval;

/// Debounced encoder and button, provided by the board.
pub trait LocalInput {
    /// Raw encoder detents accumulated since the previous call (signed).
    fn take_volume_delta(&mut self) -> i32;

    /// Level: the button is currently in a long press.
    fn button_held(&mut self) -> bool;

    /// Edge: the button was pressed since the previous call.
    fn button_pressed(&mut self) -> bool;
}

/// Applies encoder turns and button presses to the control state every
/// `volume_interval_ms`.
pub struct InputReconciler {
    speed: i32,
    interval: Interval,
}

impl InputReconciler {
    pub fn new(config: &SpeakerConfig) -> Self {
        InputReconciler {
            speed: config.volume_speed,
            interval: Interval::new(config.volume_interval_ms),
        }
    }

    /// Run a tick if one is due at `now_ms`.
    pub fn poll<I: LocalInput, const N: usize>(
        &mut self,
        now_ms: u32,
        input: &mut I,
        state: &mut DeviceControlState,
        outbox: &mut Outbox<N>,
    ) -> Result<(), ControlError> {
        if self.interval.poll(now_ms) {
            self.tick(input, state, outbox)
        } else {
            Ok(())
        }
    }

    /// Run one reconciliation tick unconditionally.
    ///
    /// Returns [`ControlError::FatalReset`] when the button is held; the
    /// caller must hand that to the platform and stop.
    pub fn tick<I: LocalInput, const N: usize>(
        &mut self,
        input: &mut I,
        state: &mut DeviceControlState,
        outbox: &mut Outbox<N>,
    ) -> Result<(), ControlError> {
        let delta = input.take_volume_delta().saturating_mul(self.speed);

        if input.button_held() {
            log::error!("Mute button held, rebooting to bootloader");
            return Err(ControlError::FatalReset(RebootMode::Bootloader));
        }

        if input.button_pressed() {
            let mute = state.toggle_master_mute();
            log::info!("Local mute toggled: {}", mute);
            queue(outbox, InterruptNotification::mute());
        }

        let current = state.system_volume() as i32;
        let target = current.saturating_add(delta).clamp(0, 255) as u8;
        if state.set_system_volume(target) {
            log::debug!("Local volume {} -> {}", current, target);
            queue(outbox, InterruptNotification::volume());
        }

        Ok(())
    }
}

/// Queue a notification, dropping it if the outbox is full.
pub(crate) fn queue<const N: usize>(outbox: &mut Outbox<N>, notification: InterruptNotification) {
    if let Err(dropped) = outbox.push(notification) {
        log::warn!("Notification outbox full, dropping {:?}", dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Channel;

    #[derive(Default)]
    struct FakeInput {
        delta: i32,
        held: bool,
        pressed: bool,
    }

    impl LocalInput for FakeInput {
        fn take_volume_delta(&mut self) -> i32 {
            core::mem::take(&mut self.delta)
        }

        fn button_held(&mut self) -> bool {
            self.held
        }

        fn button_pressed(&mut self) -> bool {
            core::mem::take(&mut self.pressed)
        }
    }

    fn setup(level: u8) -> (InputReconciler, DeviceControlState, Outbox<8>) {
        let cfg = SpeakerConfig::new().with_initial_system_volume(level);
        (InputReconciler::new(&cfg), DeviceControlState::new(&cfg), Outbox::new())
    }

    #[test]
    fn encoder_moves_knob() {
        let (mut rec, mut state, mut outbox) = setup(128);
        let mut input = FakeInput { delta: 5, ..Default::default() };

        rec.tick(&mut input, &mut state, &mut outbox).unwrap();

        assert_eq!(state.system_volume(), 178);
        assert_eq!(state.volume(Channel::MASTER), 17_800);
        assert_eq!(state.volume(Channel::LEFT), 17_800);
        assert_eq!(state.blue(), 178);
        assert_eq!(outbox.pop(), Some(InterruptNotification::volume()));
        assert!(outbox.is_empty());
    }

    #[test]
    fn knob_saturates() {
        let (mut rec, mut state, mut outbox) = setup(250);
        let mut input = FakeInput { delta: 3, ..Default::default() };
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 255);

        input.delta = -1000;
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 0);

        input.delta = i32::MIN;
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 0);

        input.delta = i32::MAX;
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 255);
    }

    #[test]
    fn knob_stays_in_range_for_any_sequence() {
        let (mut rec, mut state, mut outbox) = setup(100);
        let mut input = FakeInput::default();
        // deterministic pseudo-random walk
        let mut x: u32 = 0x1234_5678;
        for _ in 0..2000 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            input.delta = (x % 61) as i32 - 30;
            rec.tick(&mut input, &mut state, &mut outbox).unwrap();
            while outbox.pop().is_some() {}
            let v = state.system_volume();
            assert_eq!(state.volume(Channel::MASTER), v as i16 * 100);
        }
    }

    #[test]
    fn no_change_no_notification() {
        let (mut rec, mut state, mut outbox) = setup(255);
        let mut input = FakeInput { delta: 1, ..Default::default() };
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert!(outbox.is_empty());
    }

    #[test]
    fn press_toggles_paired_mute() {
        let (mut rec, mut state, mut outbox) = setup(128);
        let mut input = FakeInput { pressed: true, ..Default::default() };

        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert!(state.mute(Channel::MASTER));
        assert!(state.mute(Channel::LEFT));
        assert_eq!(state.red(), 255);
        assert_eq!(outbox.pop(), Some(InterruptNotification::mute()));

        input.pressed = true;
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert!(!state.mute(Channel::MASTER));
        assert!(!state.mute(Channel::LEFT));
        assert_eq!(state.red(), 0);
    }

    #[test]
    fn mute_and_volume_in_one_tick() {
        let (mut rec, mut state, mut outbox) = setup(100);
        let mut input = FakeInput { delta: -1, pressed: true, ..Default::default() };
        rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(outbox.pop(), Some(InterruptNotification::mute()));
        assert_eq!(outbox.pop(), Some(InterruptNotification::volume()));
        assert_eq!(state.system_volume(), 90);
    }

    #[test]
    fn hold_requests_bootloader_before_anything_else() {
        let (mut rec, mut state, mut outbox) = setup(100);
        let mut input = FakeInput { delta: 2, held: true, pressed: true };
        let err = rec.tick(&mut input, &mut state, &mut outbox).unwrap_err();
        assert_eq!(err, ControlError::FatalReset(RebootMode::Bootloader));
        assert_eq!(state.system_volume(), 100);
        assert!(!state.mute(Channel::MASTER));
        assert!(outbox.is_empty());
    }

    #[test]
    fn poll_is_rate_limited() {
        let (mut rec, mut state, mut outbox) = setup(100);
        let mut input = FakeInput { delta: 1, ..Default::default() };

        rec.poll(10, &mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 100); // not due yet, delta still pending
        assert_eq!(input.delta, 1);

        rec.poll(50, &mut input, &mut state, &mut outbox).unwrap();
        assert_eq!(state.system_volume(), 110);
    }

    #[test]
    fn full_outbox_drops_quietly() {
        let cfg = SpeakerConfig::new().with_initial_system_volume(0);
        let mut rec = InputReconciler::new(&cfg);
        let mut state = DeviceControlState::new(&cfg);
        let mut outbox: Outbox<2> = Outbox::new();
        let mut input = FakeInput::default();
        for _ in 0..3 {
            input.delta = 1;
            rec.tick(&mut input, &mut state, &mut outbox).unwrap();
        }
        assert_eq!(state.system_volume(), 30);
        assert_eq!(outbox.len(), 1);
    }
}
