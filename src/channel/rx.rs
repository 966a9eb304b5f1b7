//! Receive Channel
//!
//! Configures a lane to run [`UART_RX`] on one pin. The lane samples the
//! line on its own and pushes one word per received byte.

use crate::clock::ClockDivider;
use crate::config::SHIFT_THRESHOLD;
use crate::coprocessor::{Coprocessor, FifoJoin, LaneConfig, ShiftDirection};
use crate::error::Result;
use crate::program::UART_RX;
use crate::types::{LaneId, PinId};

/// Set up `lane` to receive on `pin`, returning the program offset
pub fn configure<C: Coprocessor>(cop: &mut C, lane: LaneId, pin: PinId, divider: ClockDivider) -> Result<u8> {
    let offset = cop.add_program(&UART_RX)?;

    cop.set_pin_dir(lane, pin, false);
    cop.gpio_init(pin);
    // Idle line reads high, start bit is the falling edge
    cop.set_pull_up(pin, true);

    let mut config = LaneConfig::for_program(&UART_RX, offset);
    config
        // WAIT and IN sample the line, JMP checks the stop bit
        .set_in_pins(pin)
        .set_jmp_pin(pin)
        .set_in_shift(ShiftDirection::Right, false, SHIFT_THRESHOLD)
        .set_fifo_join(FifoJoin::RxOnly)
        .set_clock_divider(divider);

    cop.init_lane(lane, &config);
    cop.set_enabled(lane, true);
    Ok(offset)
}

/// Byte carried by an RX FIFO word
///
/// The lane shifts right into a 32-bit ISR and pushes after 8 bits, so the
/// byte is left-justified in bits 31..24.
#[must_use]
pub const fn extract_byte(word: u32) -> u8 {
    (word >> 24) as u8
}
