//! Status indicator.
//!
//! One RGB LED shows the whole device state:
//!
//! | Channel | Meaning |
//! |---------|---------|
//! | red | master mute (255 = muted) |
//! | blue | knob position |
//! | green | heartbeat, period set by the bus state |
//!
//! Red and blue are owned by [`DeviceControlState`]; the heartbeat lives
//! here and is switched by the transport's bus callbacks.

use crate::config::SpeakerConfig;
use crate::constants::{BLINK_MOUNTED_MS, BLINK_NOT_MOUNTED_MS, BLINK_STREAMING_MS, BLINK_SUSPENDED_MS};
use crate::state::DeviceControlState;
use crate::timer::Interval;

/// Bus condition as reported by the transport callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    NotMounted,
    Mounted,
    Suspended,
    /// Mounted with the speaker streaming interface on a non-zero alt setting.
    Streaming,
}

impl BusState {
    pub fn blink_interval_ms(self) -> u32 {
        match self {
            BusState::Streaming => BLINK_STREAMING_MS,
            BusState::NotMounted => BLINK_NOT_MOUNTED_MS,
            BusState::Mounted => BLINK_MOUNTED_MS,
            BusState::Suspended => BLINK_SUSPENDED_MS,
        }
    }
}

/// RGB output, 0–255 per channel.
pub trait RgbIndicator {
    type Error;

    fn set_rgb(&mut self, red: u8, green: u8, blue: u8) -> Result<(), Self::Error>;
}

/// Drives the RGB LED: red for mute, blue for the knob, green blinking at
/// the rate of the current [`BusState`].
pub struct StatusIndicator {
    bus: BusState,
    blink: Interval,
    lit: bool,
    green: u8,
    heartbeat_level: u8,
}

impl StatusIndicator {
    pub fn new(config: &SpeakerConfig) -> Self {
        let bus = BusState::NotMounted;
        StatusIndicator {
            bus,
            blink: Interval::new(bus.blink_interval_ms()),
            lit: false,
            green: 0,
            heartbeat_level: config.heartbeat_level,
        }
    }

    pub fn bus_state(&self) -> BusState {
        self.bus
    }

    pub fn set_bus_state(&mut self, bus: BusState) {
        self.bus = bus;
        self.blink.set_period_ms(bus.blink_interval_ms());
    }

    pub fn blink_interval_ms(&self) -> u32 {
        self.blink.period_ms()
    }

    /// Current (red, green, blue) levels.
    pub fn levels(&self, state: &DeviceControlState) -> (u8, u8, u8) {
        (state.red(), self.green, state.blue())
    }

    /// Advance the heartbeat and push the current levels to `led`.
    pub fn poll<L: RgbIndicator>(
        &mut self,
        now_ms: u32,
        state: &DeviceControlState,
        led: &mut L,
    ) -> Result<(), L::Error> {
        if self.blink.poll(now_ms) {
            self.green = if self.lit { self.heartbeat_level } else { 0 };
            self.lit = !self.lit;
        }
        let (red, green, blue) = self.levels(state);
        led.set_rgb(red, green, blue)
    }
}

#[cfg(feature = "pwm-indicator")]
pub use pwm::PwmRgb;

#[cfg(feature = "pwm-indicator")]
mod pwm {
    use embedded_hal::pwm::SetDutyCycle;

    use super::RgbIndicator;

    /// Three PWM channels driving a common RGB LED.
    pub struct PwmRgb<R, G, B> {
        red: R,
        green: G,
        blue: B,
    }

    impl<R, G, B> PwmRgb<R, G, B>
    where
        R: SetDutyCycle,
        G: SetDutyCycle<Error = R::Error>,
        B: SetDutyCycle<Error = R::Error>,
    {
        pub fn new(red: R, green: G, blue: B) -> Self {
            PwmRgb { red, green, blue }
        }

        pub fn release(self) -> (R, G, B) {
            (self.red, self.green, self.blue)
        }
    }

    impl<R, G, B> RgbIndicator for PwmRgb<R, G, B>
    where
        R: SetDutyCycle,
        G: SetDutyCycle<Error = R::Error>,
        B: SetDutyCycle<Error = R::Error>,
    {
        type Error = R::Error;

        fn set_rgb(&mut self, red: u8, green: u8, blue: u8) -> Result<(), Self::Error> {
            self.red.set_duty_cycle_fraction(red as u16, 255)?;
            self.green.set_duty_cycle_fraction(green as u16, 255)?;
            self.blue.set_duty_cycle_fraction(blue as u16, 255)
        }
    }

}
