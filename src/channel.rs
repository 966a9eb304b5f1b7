//! Serial Channels
//!
//! One channel per direction. A channel records its pin and lane choice at
//! construction and only touches the coprocessor when it is materialized.
//! Teardown returns every resource it took: lane, program memory and pin.

pub mod rx;
pub mod tx;

use crate::clock::ClockDivider;
use crate::coprocessor::Coprocessor;
use crate::error::{Direction, Error, Result};
use crate::program::{ProgramAsset, UART_RX, UART_TX};
use crate::types::{LaneId, PinId};

/// How a channel picks its lane
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum LaneChoice {
    /// Always use this lane
    Fixed(LaneId),
    /// Claim the lowest free lane at start
    Auto,
}

/// Hardware resources held by a running channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveLane {
    /// Lane running the program
    pub lane: LaneId,
    /// Instruction memory offset of the program
    pub offset: u8,
    /// Clock divider applied to the lane
    pub divider: ClockDivider,
}

/// One direction of the serial port
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Channel {
    direction: Direction,
    pin: Option<PinId>,
    lane: LaneChoice,
    active: Option<ActiveLane>,
}

impl Channel {
    /// Record a channel; no hardware is touched
    #[must_use]
    pub const fn new(direction: Direction, pin: Option<PinId>, lane: LaneChoice) -> Self {
        Self {
            direction,
            pin,
            lane,
            active: None,
        }
    }

    /// Direction of this channel
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Line pin, if one was given
    #[must_use]
    pub const fn pin(&self) -> Option<PinId> {
        self.pin
    }

    /// Requested lane
    #[must_use]
    pub const fn lane_choice(&self) -> LaneChoice {
        self.lane
    }

    /// Resources held while running
    #[must_use]
    pub const fn active(&self) -> Option<ActiveLane> {
        self.active
    }

    /// Whether the lane is configured and enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// Lane of a running channel, or the direction's error
    pub fn running_lane(&self) -> Result<LaneId> {
        self.active
            .map(|active| active.lane)
            .ok_or(Error::NotConfigured(self.direction))
    }

    const fn program(&self) -> &'static ProgramAsset {
        match self.direction {
            Direction::Rx => &UART_RX,
            Direction::Tx => &UART_TX,
        }
    }

    /// Configure and enable the lane
    ///
    /// Returns `Ok(false)` without touching anything when the channel has
    /// no pin. On failure every resource taken so far is released.
    pub fn materialize<C: Coprocessor>(&mut self, cop: &mut C, divider: ClockDivider) -> Result<bool> {
        let Some(pin) = self.pin else {
            return Ok(false);
        };
        if self.active.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let lane = match self.lane {
            LaneChoice::Fixed(lane) => cop.lanes().acquire(lane).map(|()| lane)?,
            LaneChoice::Auto => cop.lanes().acquire_any()?,
        };

        let configured = match self.direction {
            Direction::Rx => rx::configure(cop, lane, pin, divider),
            Direction::Tx => tx::configure(cop, lane, pin, divider),
        };

        match configured {
            Ok(offset) => {
                debug!(
                    "{} channel on {} lane {} offset {} div {}",
                    self.direction, pin, lane, offset, divider
                );
                self.active = Some(ActiveLane { lane, offset, divider });
                Ok(true)
            }
            Err(err) => {
                cop.lanes().release(lane);
                Err(err)
            }
        }
    }

    /// Disable the lane and give back everything it held
    ///
    /// Does nothing on a channel that is not running.
    pub fn teardown<C: Coprocessor>(&mut self, cop: &mut C) {
        let (Some(active), Some(pin)) = (self.active.take(), self.pin) else {
            return;
        };

        cop.set_enabled(active.lane, false);
        cop.clear_fifos(active.lane);
        if self.direction == Direction::Rx {
            cop.set_pull_up(pin, false);
        }
        cop.gpio_deinit(pin);
        cop.remove_program(self.program(), active.offset);
        cop.lanes().release(active.lane);

        debug!("{} channel on {} released lane {}", self.direction, pin, active.lane);
    }
}
