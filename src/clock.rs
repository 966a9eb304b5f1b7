//! Clock Divisor Calculation
//!
//! Derives the lane clock divider from the system clock and the requested
//! baud rate. Each bit on the wire takes [`OVERSAMPLE_FACTOR`] lane cycles,
//! which puts the receive sample point in the middle of every bit.
//!
//! The divider register is 16.8 fixed point: a 16-bit integer part where 0
//! encodes 65536, and an 8-bit fraction. The calculation itself does not
//! reject anything; [`ClockDivider::is_in_range`] tells the caller whether
//! the hardware can represent the value.

use fixed::types::U24F8;

use crate::config::{MAX_CLOCK_DIVIDER, MIN_CLOCK_DIVIDER, OVERSAMPLE_FACTOR};

/// Fractional lane clock divider
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ClockDivider(f32);

impl ClockDivider {
    /// Undivided system clock
    pub const UNITY: Self = Self(1.0);

    /// Divider for `baud` given a system clock of `clock_hz`
    ///
    /// `clock_hz / (8 * baud)`, computed in floating point so large baud
    /// rates cannot overflow the product.
    #[must_use]
    pub fn from_baud(clock_hz: u32, baud: u32) -> Self {
        Self(clock_hz as f32 / (OVERSAMPLE_FACTOR as f32 * baud as f32))
    }

    /// Wrap a raw divider value
    #[must_use]
    pub const fn from_f32(value: f32) -> Self {
        Self(value)
    }

    /// Get the divider as floating point
    #[must_use]
    pub const fn as_f32(self) -> f32 {
        self.0
    }

    /// Check whether the hardware can represent this divider
    #[must_use]
    pub fn is_in_range(self) -> bool {
        self.0 >= MIN_CLOCK_DIVIDER && self.0 <= MAX_CLOCK_DIVIDER
    }

    /// Quantize to 24.8 fixed point, saturating
    #[must_use]
    pub fn to_fixed(self) -> U24F8 {
        U24F8::checked_from_num(self.0).unwrap_or(U24F8::MAX)
    }

    /// Register encoding `(int, frac)`, clamped to the hardware range
    ///
    /// Below 1.0 the lane runs undivided; at or above 65536 the integer
    /// field is 0, which the hardware reads as 65536.
    #[must_use]
    pub fn register_fields(self) -> (u16, u8) {
        let bits = self.to_fixed().to_bits();
        let int = bits >> 8;
        if int == 0 {
            (1, 0)
        } else if int >= 0x1_0000 {
            (0, 0)
        } else {
            (int as u16, (bits & 0xff) as u8)
        }
    }

    /// Divider the hardware will actually apply, after quantization
    #[must_use]
    pub fn effective(self) -> f32 {
        match self.register_fields() {
            (0, _) => MAX_CLOCK_DIVIDER,
            (int, frac) => f32::from(int) + f32::from(frac) / 256.0,
        }
    }

    /// Baud rate the quantized divider produces at `clock_hz`
    #[must_use]
    pub fn actual_baud(self, clock_hz: u32) -> f32 {
        clock_hz as f32 / (self.effective() * OVERSAMPLE_FACTOR as f32)
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self::UNITY
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockDivider {
    fn format(&self, f: defmt::Formatter) {
        let (int, frac) = self.register_fields();
        defmt::write!(f, "{}+{}/256", int, frac);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_115200_at_125mhz() {
        let div = ClockDivider::from_baud(125_000_000, 115_200);
        assert!((div.as_f32() - 135.634).abs() < 0.01);
        assert!(div.is_in_range());
    }

    #[test]
    fn register_fields_split() {
        // 135.634 -> 135 + 162/256
        let div = ClockDivider::from_baud(125_000_000, 115_200);
        let (int, frac) = div.register_fields();
        assert_eq!(int, 135);
        assert_eq!(frac, 162);
    }

    #[test]
    fn register_fields_clamp_low() {
        assert_eq!(ClockDivider::from_f32(0.25).register_fields(), (1, 0));
    }

    #[test]
    fn register_fields_clamp_high() {
        assert_eq!(ClockDivider::from_f32(70_000.0).register_fields(), (0, 0));
        assert_eq!(ClockDivider::from_f32(70_000.0).effective(), 65_536.0);
    }

    #[test]
    fn zero_baud_saturates() {
        let div = ClockDivider::from_baud(125_000_000, 0);
        assert!(!div.is_in_range());
        assert_eq!(div.register_fields(), (0, 0));
    }
}
