//! Driver errors
//!
//! Register writes to the PIO block cannot fail, so every error here is a
//! usage or resource error caught before the hardware is touched.

use core::fmt;

use crate::types::LaneId;

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Transfer direction of a channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum Direction {
    /// Receive (line into the RX FIFO)
    Rx,
    /// Transmit (TX FIFO onto the line)
    Tx,
}

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A stream operation needs a direction that has no pin or was stopped
    NotConfigured(Direction),
    /// The lane is already claimed by another channel or driver
    LaneInUse(LaneId),
    /// Every lane of the PIO block is claimed
    LanesExhausted,
    /// Not enough free instruction memory for the program
    ProgramSpace,
    /// `start` called on a serial that is already running
    AlreadyStarted,
    /// Baud rate of zero
    InvalidBaudRate,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured(Direction::Rx) => f.write_str("receive direction not configured"),
            Self::NotConfigured(Direction::Tx) => f.write_str("transmit direction not configured"),
            Self::LaneInUse(lane) => write!(f, "lane {lane} already in use"),
            Self::LanesExhausted => f.write_str("no free lane"),
            Self::ProgramSpace => f.write_str("instruction memory full"),
            Self::AlreadyStarted => f.write_str("serial already started"),
            Self::InvalidBaudRate => f.write_str("baud rate must be positive"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotConfigured(dir) => defmt::write!(f, "NotConfigured({})", dir),
            Self::LaneInUse(lane) => defmt::write!(f, "LaneInUse({})", lane),
            Self::LanesExhausted => defmt::write!(f, "LanesExhausted"),
            Self::ProgramSpace => defmt::write!(f, "ProgramSpace"),
            Self::AlreadyStarted => defmt::write!(f, "AlreadyStarted"),
            Self::InvalidBaudRate => defmt::write!(f, "InvalidBaudRate"),
        }
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NotConfigured(_) | Self::InvalidBaudRate => embedded_io::ErrorKind::InvalidInput,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}
