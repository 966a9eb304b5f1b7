//! Software Serial Port
//!
//! Full-duplex 8N1 serial over two GPIO pins, one PIO lane per direction.
//!
//! Construction only records pins and lanes. [`SoftwareSerial::start`]
//! loads the programs, routes the pins and enables the lanes; after that the
//! stream operations talk to the lanes purely through their FIFOs.
//!
//! # Example
//!
//! ```ignore
//! let cop = RpCoprocessor::pio1(p.PIO1);
//! let mut serial = SoftwareSerial::new(cop, Some(PinId::GP4), Some(PinId::GP5));
//! serial.start(115_200)?;
//! serial.write(b'A')?;
//! if let Some(byte) = serial.read()? {
//!     // ...
//! }
//! ```

use crate::channel::{rx, tx, Channel};
use crate::clock::ClockDivider;
use crate::config::{DEFAULT_BAUD, DEFAULT_RX_LANE, DEFAULT_TX_LANE};
use crate::coprocessor::Coprocessor;
use crate::error::{Direction, Error, Result};
use crate::types::{FrameConfig, PinId};

pub use crate::channel::LaneChoice;

/// Serial port running on two PIO lanes
pub struct SoftwareSerial<C: Coprocessor> {
    cop: C,
    rx: Channel,
    tx: Channel,
    baud: Option<u32>,
    /// Byte taken from the RX FIFO by `peek` and not yet read
    peeked: Option<u8>,
}

impl<C: Coprocessor> SoftwareSerial<C> {
    /// Record a serial port on the default lanes (RX on SM0, TX on SM1)
    ///
    /// A direction whose pin is `None` is never configured.
    #[must_use]
    pub fn new(cop: C, tx_pin: Option<PinId>, rx_pin: Option<PinId>) -> Self {
        Self::with_lanes(
            cop,
            tx_pin,
            rx_pin,
            LaneChoice::Fixed(DEFAULT_RX_LANE),
            LaneChoice::Fixed(DEFAULT_TX_LANE),
        )
    }

    /// Record a serial port with explicit lane choices
    #[must_use]
    pub fn with_lanes(
        cop: C,
        tx_pin: Option<PinId>,
        rx_pin: Option<PinId>,
        rx_lane: LaneChoice,
        tx_lane: LaneChoice,
    ) -> Self {
        Self {
            cop,
            rx: Channel::new(Direction::Rx, rx_pin, rx_lane),
            tx: Channel::new(Direction::Tx, tx_pin, tx_lane),
            baud: None,
            peeked: None,
        }
    }

    /// Start at the default 115200 baud
    pub fn start_default(&mut self) -> Result<()> {
        self.start(DEFAULT_BAUD)
    }

    /// Configure and enable every direction that has a pin
    ///
    /// Either both directions come up or neither does.
    pub fn start(&mut self, baud: u32) -> Result<()> {
        if baud == 0 {
            return Err(Error::InvalidBaudRate);
        }
        if self.baud.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let divider = ClockDivider::from_baud(self.cop.clock_hz(), baud);
        if !divider.is_in_range() {
            warn!("divider {} out of range for {} baud", divider.as_f32(), baud);
        }

        self.rx.materialize(&mut self.cop, divider)?;
        if let Err(err) = self.tx.materialize(&mut self.cop, divider) {
            self.rx.teardown(&mut self.cop);
            return Err(err);
        }

        self.baud = Some(baud);
        info!(
            "serial started at {} baud (rx {}, tx {})",
            baud,
            self.rx.is_enabled(),
            self.tx.is_enabled()
        );
        Ok(())
    }

    /// Start with a caller-supplied frame format
    ///
    /// The lanes only implement 8N1; `frame` is accepted and ignored.
    pub fn start_with_config(&mut self, baud: u32, frame: FrameConfig) -> Result<()> {
        if !frame.is_native() {
            debug!("ignoring frame config {}, running 8N1", frame);
        }
        self.start(baud)
    }

    /// Disable both lanes and release their pins, programs and lanes
    ///
    /// A stopped port can be started again. Stopping a port that is not
    /// running does nothing.
    pub fn stop(&mut self) {
        self.rx.teardown(&mut self.cop);
        self.tx.teardown(&mut self.cop);
        self.peeked = None;
        if self.baud.take().is_some() {
            info!("serial stopped");
        }
    }

    /// Same as [`stop`](Self::stop)
    pub fn end(&mut self) {
        self.stop();
    }

    /// Whether `start` has succeeded and `stop` has not been called since
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.baud.is_some()
    }

    /// Baud rate the port was started with
    #[must_use]
    pub const fn baud(&self) -> Option<u32> {
        self.baud
    }

    /// Divider shared by both lanes while running
    #[must_use]
    pub fn divider(&self) -> Option<ClockDivider> {
        self.rx
            .active()
            .or_else(|| self.tx.active())
            .map(|active| active.divider)
    }

    /// Receive channel
    #[must_use]
    pub const fn rx_channel(&self) -> &Channel {
        &self.rx
    }

    /// Transmit channel
    #[must_use]
    pub const fn tx_channel(&self) -> &Channel {
        &self.tx
    }

    /// Number of words waiting in the RX FIFO
    ///
    /// A byte held by `peek` has already left the FIFO and is not counted.
    pub fn available(&self) -> Result<usize> {
        let lane = self.rx.running_lane()?;
        Ok(self.cop.rx_level(lane))
    }

    /// Look at the next byte without consuming it
    pub fn peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.read()?;
        }
        Ok(self.peeked)
    }

    /// Take the next byte, `None` if nothing has arrived
    ///
    /// Never blocks. A byte held by `peek` is returned first.
    pub fn read(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.peeked.take() {
            return Ok(Some(byte));
        }
        let lane = self.rx.running_lane()?;
        Ok(self.cop.rx_pop(lane).map(rx::extract_byte))
    }

    /// Queue a byte for transmission, waiting while the TX FIFO is full
    ///
    /// Returns the number of bytes accepted, always 1.
    pub fn write(&mut self, byte: u8) -> Result<usize> {
        let lane = self.tx.running_lane()?;
        self.cop.tx_push_blocking(lane, tx::frame_word(byte));
        Ok(1)
    }

    /// Whether `write` would return without waiting
    pub fn write_ready(&self) -> Result<bool> {
        let lane = self.tx.running_lane()?;
        Ok(!self.cop.tx_is_full(lane))
    }

    /// Returns immediately
    ///
    /// Bytes still in the TX FIFO or on the wire are not waited for.
    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Readiness check; the port has no failure state to report
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        true
    }

    /// Coprocessor handle
    #[must_use]
    pub const fn coprocessor(&self) -> &C {
        &self.cop
    }

    /// Mutable coprocessor handle
    pub fn coprocessor_mut(&mut self) -> &mut C {
        &mut self.cop
    }

    /// Stop the port and hand back the coprocessor
    pub fn release(mut self) -> C {
        self.stop();
        self.cop
    }
}
