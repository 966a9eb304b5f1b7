//! PIO Software Serial Library
//!
//! This library provides a full-duplex asynchronous serial port for the
//! RP2040 that runs on two PIO state machines instead of a UART peripheral.
//! Any two GPIO pins can carry the line.
//!
//! # Architecture
//!
//! The crate is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BYTE-STREAM FACADE                       │
//! │  SoftwareSerial  │  ByteStream helpers  │  embedded-io       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        CHANNELS                              │
//! │  RX channel  │  TX channel  │  Lane allocator  │  Divisor    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   COPROCESSOR SEAM                           │
//! │  Coprocessor trait  │  LaneConfig  │  Program assets         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       BACKENDS                               │
//! │  RP2040 PIO registers (embedded)  │  Simulator (host)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Construction touches no hardware**: pins and lanes are recorded,
//!   `start` materializes them
//! - **FIFOs are the only channel**: the lanes run autonomously and software
//!   talks to them through their hardware queues
//! - **No unsafe in driver code**: register access goes through the PAC
//! - **Explicit error handling**: misuse is reported through `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_rp;
#[cfg(feature = "embedded")]
pub use embassy_time;

#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// RP2040 PIO register backend for the coprocessor seam.
#[cfg(feature = "embedded")]
pub mod hal;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Error type
pub mod error;

/// Clock divisor calculation
pub mod clock;

/// Fixed bit-stream programs and instruction memory
pub mod program;

/// Coprocessor abstraction
///
/// The seam between the driver and the PIO hardware (or its simulator).
pub mod coprocessor;

/// Lane (state machine) allocation
pub mod lanes;

/// RX and TX channel setup
pub mod channel;

/// The serial port facade
pub mod serial;

/// Byte-stream capability trait and print helpers
pub mod stream;

/// Host-side PIO simulator
pub mod sim;

pub use error::{Direction, Error};
pub use serial::SoftwareSerial;
pub use stream::ByteStream;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::coprocessor::Coprocessor;
    pub use crate::error::{Direction, Error};
    pub use crate::serial::{LaneChoice, SoftwareSerial};
    pub use crate::stream::{print, print_fmt, println, ByteStream};
    pub use crate::types::*;

    #[cfg(feature = "embedded")]
    pub use crate::hal::pio::RpCoprocessor;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
