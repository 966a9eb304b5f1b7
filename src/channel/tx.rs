//! Transmit Channel
//!
//! Configures a lane to run [`UART_TX`] on one pin. OUT and side-set share
//! the pin: data bits go through OUT, start and stop bits through side-set.

use crate::clock::ClockDivider;
use crate::config::SHIFT_THRESHOLD;
use crate::coprocessor::{Coprocessor, FifoJoin, LaneConfig, ShiftDirection};
use crate::error::Result;
use crate::program::UART_TX;
use crate::types::{LaneId, PinId};

/// Set up `lane` to transmit on `pin`, returning the program offset
pub fn configure<C: Coprocessor>(cop: &mut C, lane: LaneId, pin: PinId, divider: ClockDivider) -> Result<u8> {
    let offset = cop.add_program(&UART_TX)?;

    // Drive idle-high before the pin is muxed to the block
    cop.set_pin_level(lane, pin, true);
    cop.set_pin_dir(lane, pin, true);
    cop.gpio_init(pin);

    let mut config = LaneConfig::for_program(&UART_TX, offset);
    config
        .set_out_shift(ShiftDirection::Right, false, SHIFT_THRESHOLD)
        .set_out_pins(pin, 1)
        .set_sideset_pins(pin)
        .set_fifo_join(FifoJoin::TxOnly)
        .set_clock_divider(divider);

    cop.init_lane(lane, &config);
    cop.set_enabled(lane, true);
    Ok(offset)
}

/// TX FIFO word for `byte`; the lane shifts it out LSB first
#[must_use]
pub const fn frame_word(byte: u8) -> u32 {
    byte as u32
}
