//! Shared types used across the driver
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time and provide type safety throughout the codebase.

use core::fmt;

use crate::config::{FUNCSEL_PIO0, FUNCSEL_PIO1, LANES_PER_INSTANCE, NUM_GPIOS};

/// GPIO number in bank 0 (0-29)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(u8);

impl PinId {
    /// GPIO 0
    pub const GP0: Self = Self(0);
    /// GPIO 1
    pub const GP1: Self = Self(1);
    /// GPIO 4
    pub const GP4: Self = Self(4);
    /// GPIO 5
    pub const GP5: Self = Self(5);

    /// Create a pin id, returns None if the GPIO does not exist
    #[must_use]
    pub const fn new(gpio: u8) -> Option<Self> {
        if (gpio as usize) < NUM_GPIOS {
            Some(Self(gpio))
        } else {
            None
        }
    }

    /// Get the GPIO number
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Get the GPIO number as an index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for this pin
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Debug for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GP{}", self.0)
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GP{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PinId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "GP{}", self.0);
    }
}

/// State machine index within a PIO block (0-3)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaneId(u8);

impl LaneId {
    /// State machine 0
    pub const SM0: Self = Self(0);
    /// State machine 1
    pub const SM1: Self = Self(1);
    /// State machine 2
    pub const SM2: Self = Self(2);
    /// State machine 3
    pub const SM3: Self = Self(3);

    /// All lanes in index order
    pub const ALL: [Self; LANES_PER_INSTANCE] = [Self::SM0, Self::SM1, Self::SM2, Self::SM3];

    /// Create a lane id, returns None if out of range
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < LANES_PER_INSTANCE {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the index as usize
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for this lane
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.0
    }
}

impl fmt::Debug for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SM{}", self.0)
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SM{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LaneId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SM{}", self.0);
    }
}

/// PIO block selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum PioInstance {
    /// PIO block 0
    Pio0,
    /// PIO block 1
    Pio1,
}

impl PioInstance {
    /// Index of the block
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pio0 => 0,
            Self::Pio1 => 1,
        }
    }

    /// GPIO function select value that routes a pin to this block
    #[must_use]
    pub const fn funcsel(self) -> u8 {
        match self {
            Self::Pio0 => FUNCSEL_PIO0,
            Self::Pio1 => FUNCSEL_PIO1,
        }
    }
}

/// Data bits per character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum DataBits {
    /// Five data bits
    Five,
    /// Six data bits
    Six,
    /// Seven data bits
    Seven,
    /// Eight data bits
    #[default]
    Eight,
}

/// Parity configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Parity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Stop bits configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// Character framing requested by a caller
///
/// The lanes always run 8N1. Other values are accepted so callers written
/// against a configurable UART keep compiling, and are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct FrameConfig {
    /// Data bits
    pub data_bits: DataBits,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
}

impl FrameConfig {
    /// 8 data bits, no parity, 1 stop bit
    pub const EIGHT_N_ONE: Self = Self {
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };

    /// Check whether this matches the framing the lanes implement
    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::EIGHT_N_ONE
    }
}
