//! GPIO Abstractions
//!
//! Pin wrappers used by the firmware around the serial port.

use embassy_rp::gpio::Output;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Opposite state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Heartbeat LED
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Wrap an output that starts low
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Drive the LED to `state`
    pub fn set(&mut self, state: LedState) {
        match state {
            LedState::On => self.pin.set_high(),
            LedState::Off => self.pin.set_low(),
        }
        self.state = state;
    }

    /// Flip the LED
    pub fn toggle(&mut self) {
        self.set(self.state.toggle());
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}
