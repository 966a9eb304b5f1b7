//! Hardware Abstraction Layer
//!
//! RP2040-specific code: the PIO register backend behind the coprocessor
//! seam and the board's status LED.

pub mod gpio;
pub mod pio;
