//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the PIO serial driver.
//! Lane counts, FIFO depths, timing parameters and the demo board pin map
//! are centralized here.

use crate::types::{LaneId, PinId, PioInstance};

/// Reference system clock (RP2040 default `clk_sys` @ 125MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 125_000_000;

/// Lane execution cycles spent on each bit of a frame
pub const OVERSAMPLE_FACTOR: u32 = 8;

/// Default line rate
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default receive lane
pub const DEFAULT_RX_LANE: LaneId = LaneId::SM0;

/// Default transmit lane
pub const DEFAULT_TX_LANE: LaneId = LaneId::SM1;

/// Default PIO block for the firmware binary
pub const DEFAULT_INSTANCE: PioInstance = PioInstance::Pio1;

/// State machines per PIO block
pub const LANES_PER_INSTANCE: usize = 4;

/// Number of PIO blocks on the RP2040
pub const NUM_INSTANCES: usize = 2;

/// Number of user GPIOs in bank 0
pub const NUM_GPIOS: usize = 30;

/// FIFO depth per direction when not joined
pub const FIFO_DEPTH: usize = 4;

/// FIFO depth when the opposite direction is joined in
pub const JOINED_FIFO_DEPTH: usize = FIFO_DEPTH * 2;

/// Instruction memory slots per PIO block
pub const INSTRUCTION_MEMORY_SIZE: usize = 32;

/// Width of a FIFO word and of the shift registers, in bits
pub const SHIFT_THRESHOLD: u8 = 32;

/// Smallest usable clock divider (full speed)
pub const MIN_CLOCK_DIVIDER: f32 = 1.0;

/// Largest clock divider (integer part 0 encodes 65536)
pub const MAX_CLOCK_DIVIDER: f32 = 65_536.0;

/// Data bits per frame
pub const DATA_BITS: u32 = 8;

/// Bits on the wire per frame (start + data + stop)
pub const FRAME_BITS: u32 = DATA_BITS + 2;

/// GPIO function select for PIO0
pub const FUNCSEL_PIO0: u8 = 6;

/// GPIO function select for PIO1
pub const FUNCSEL_PIO1: u8 = 7;

/// GPIO function select for the null function (pin released)
pub const FUNCSEL_NULL: u8 = 0x1f;

/// Pin assignments for the echo firmware
pub mod pins {
    //! GPIO pin assignments for the Raspberry Pi Pico demo wiring

    use crate::types::PinId;

    /// Serial transmit (GP4, Pico pin 6)
    pub const SERIAL_TX: PinId = PinId::GP4;

    /// Serial receive (GP5, Pico pin 7)
    pub const SERIAL_RX: PinId = PinId::GP5;
}

/// Heartbeat LED period in milliseconds
pub const HEARTBEAT_PERIOD_MS: u64 = 1_000;

/// Idle poll interval of the echo loop in microseconds
pub const ECHO_POLL_US: u64 = 50;

/// Default demo transmit pin
#[must_use]
pub const fn default_tx_pin() -> PinId {
    pins::SERIAL_TX
}

/// Default demo receive pin
#[must_use]
pub const fn default_rx_pin() -> PinId {
    pins::SERIAL_RX
}
