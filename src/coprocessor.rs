//! Coprocessor Abstraction
//!
//! The PIO block as seen by the channels: program memory, per-lane
//! configuration, pin routing and the lane FIFOs. The RP2040 register
//! backend lives in [`crate::hal::pio`]; [`crate::sim`] implements the same
//! trait on the host.
//!
//! Lane and pin arguments are runtime indices, the way board code names
//! them. Nothing here checks for conflicting use; that is the job of
//! [`crate::lanes`].

use crate::clock::ClockDivider;
use crate::config::SHIFT_THRESHOLD;
use crate::error::Result;
use crate::lanes::LaneAllocator;
use crate::program::{ProgramAsset, SideSet};
use crate::types::{LaneId, PinId, PioInstance};

/// Shift register direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum ShiftDirection {
    /// Shift towards the LSB (data leaves/enters LSB first)
    #[default]
    Right,
    /// Shift towards the MSB
    Left,
}

/// Shift register configuration for one direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub struct ShiftConfig {
    /// Shift direction
    pub direction: ShiftDirection,
    /// Automatic push/pull at the threshold
    pub auto: bool,
    /// Bits before an automatic push/pull (1-32)
    pub threshold: u8,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            direction: ShiftDirection::Right,
            auto: false,
            threshold: SHIFT_THRESHOLD,
        }
    }
}

/// FIFO joining mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum FifoJoin {
    /// Separate 4-deep RX and TX FIFOs
    #[default]
    Duplex,
    /// 8-deep RX FIFO, no TX FIFO
    RxOnly,
    /// 8-deep TX FIFO, no RX FIFO
    TxOnly,
}

/// Full configuration of one lane
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneConfig {
    /// Absolute address the lane starts executing from
    pub origin: u8,
    /// Absolute wrap target
    pub wrap_target: u8,
    /// Absolute wrap source
    pub wrap: u8,
    /// Side-set configuration of the loaded program
    pub side_set: SideSet,
    /// First side-set pin
    pub sideset_base: Option<PinId>,
    /// First OUT pin
    pub out_base: Option<PinId>,
    /// Number of OUT pins
    pub out_count: u8,
    /// First IN pin
    pub in_base: Option<PinId>,
    /// Pin tested by `jmp pin`
    pub jmp_pin: Option<PinId>,
    /// ISR configuration
    pub in_shift: ShiftConfig,
    /// OSR configuration
    pub out_shift: ShiftConfig,
    /// FIFO joining
    pub fifo_join: FifoJoin,
    /// Clock divider
    pub clock_divider: ClockDivider,
}

impl LaneConfig {
    /// Default configuration for `program` loaded at `offset`
    ///
    /// Carries the program's wrap and side-set settings, no pin mapping.
    #[must_use]
    pub fn for_program(program: &ProgramAsset, offset: u8) -> Self {
        Self {
            origin: offset,
            wrap_target: offset + program.wrap_target,
            wrap: offset + program.wrap,
            side_set: program.side_set,
            sideset_base: None,
            out_base: None,
            out_count: 0,
            in_base: None,
            jmp_pin: None,
            in_shift: ShiftConfig::default(),
            out_shift: ShiftConfig::default(),
            fifo_join: FifoJoin::Duplex,
            clock_divider: ClockDivider::UNITY,
        }
    }

    /// Use `pin` as the first IN pin
    pub fn set_in_pins(&mut self, pin: PinId) -> &mut Self {
        self.in_base = Some(pin);
        self
    }

    /// Use `pin` as the JMP condition pin
    pub fn set_jmp_pin(&mut self, pin: PinId) -> &mut Self {
        self.jmp_pin = Some(pin);
        self
    }

    /// Map `count` OUT pins starting at `base`
    pub fn set_out_pins(&mut self, base: PinId, count: u8) -> &mut Self {
        self.out_base = Some(base);
        self.out_count = count;
        self
    }

    /// Map the side-set pins starting at `base`
    pub fn set_sideset_pins(&mut self, base: PinId) -> &mut Self {
        self.sideset_base = Some(base);
        self
    }

    /// Configure the ISR
    pub fn set_in_shift(&mut self, direction: ShiftDirection, autopush: bool, threshold: u8) -> &mut Self {
        self.in_shift = ShiftConfig {
            direction,
            auto: autopush,
            threshold,
        };
        self
    }

    /// Configure the OSR
    pub fn set_out_shift(&mut self, direction: ShiftDirection, autopull: bool, threshold: u8) -> &mut Self {
        self.out_shift = ShiftConfig {
            direction,
            auto: autopull,
            threshold,
        };
        self
    }

    /// Set FIFO joining
    pub fn set_fifo_join(&mut self, join: FifoJoin) -> &mut Self {
        self.fifo_join = join;
        self
    }

    /// Set the clock divider
    pub fn set_clock_divider(&mut self, divider: ClockDivider) -> &mut Self {
        self.clock_divider = divider;
        self
    }
}

/// A PIO block
///
/// Methods mirror the primitive operations the hardware offers. None of them
/// fail except program loading, which can run out of instruction memory.
pub trait Coprocessor {
    /// Which block this is
    fn instance(&self) -> PioInstance;

    /// Frequency of the clock feeding the block, in Hz
    fn clock_hz(&self) -> u32;

    /// Lane claims for this block
    fn lanes(&self) -> &LaneAllocator;

    /// Load `program` into instruction memory, returning its offset
    fn add_program(&mut self, program: &ProgramAsset) -> Result<u8>;

    /// Free the instruction memory of `program` loaded at `offset`
    fn remove_program(&mut self, program: &ProgramAsset, offset: u8);

    /// Set the direction of `pin` as seen by `lane` (true = output)
    fn set_pin_dir(&mut self, lane: LaneId, pin: PinId, output: bool);

    /// Set the output level of `pin` as driven by `lane`
    fn set_pin_level(&mut self, lane: LaneId, pin: PinId, high: bool);

    /// Route `pin` to this block
    fn gpio_init(&mut self, pin: PinId);

    /// Return `pin` to the null function
    fn gpio_deinit(&mut self, pin: PinId);

    /// Enable or disable the pad pull-up of `pin`
    fn set_pull_up(&mut self, pin: PinId, enabled: bool);

    /// Apply `config` to `lane`, reset it and point it at `config.origin`
    ///
    /// The lane is left disabled.
    fn init_lane(&mut self, lane: LaneId, config: &LaneConfig);

    /// Start or stop `lane`
    fn set_enabled(&mut self, lane: LaneId, enabled: bool);

    /// Drop everything queued in both FIFOs of `lane`
    fn clear_fifos(&mut self, lane: LaneId);

    /// Words waiting in the RX FIFO of `lane`
    fn rx_level(&self, lane: LaneId) -> usize;

    /// Whether the RX FIFO of `lane` is empty
    fn rx_is_empty(&self, lane: LaneId) -> bool {
        self.rx_level(lane) == 0
    }

    /// Pop the oldest RX word of `lane`, if any
    fn rx_pop(&mut self, lane: LaneId) -> Option<u32>;

    /// Whether the TX FIFO of `lane` has no free slot
    fn tx_is_full(&self, lane: LaneId) -> bool;

    /// Push `word` into the TX FIFO of `lane`, waiting for a free slot
    fn tx_push_blocking(&mut self, lane: LaneId, word: u32);
}

impl<T: Coprocessor + ?Sized> Coprocessor for &mut T {
    fn instance(&self) -> PioInstance {
        (**self).instance()
    }

    fn clock_hz(&self) -> u32 {
        (**self).clock_hz()
    }

    fn lanes(&self) -> &LaneAllocator {
        (**self).lanes()
    }

    fn add_program(&mut self, program: &ProgramAsset) -> Result<u8> {
        (**self).add_program(program)
    }

    fn remove_program(&mut self, program: &ProgramAsset, offset: u8) {
        (**self).remove_program(program, offset);
    }

    fn set_pin_dir(&mut self, lane: LaneId, pin: PinId, output: bool) {
        (**self).set_pin_dir(lane, pin, output);
    }

    fn set_pin_level(&mut self, lane: LaneId, pin: PinId, high: bool) {
        (**self).set_pin_level(lane, pin, high);
    }

    fn gpio_init(&mut self, pin: PinId) {
        (**self).gpio_init(pin);
    }

    fn gpio_deinit(&mut self, pin: PinId) {
        (**self).gpio_deinit(pin);
    }

    fn set_pull_up(&mut self, pin: PinId, enabled: bool) {
        (**self).set_pull_up(pin, enabled);
    }

    fn init_lane(&mut self, lane: LaneId, config: &LaneConfig) {
        (**self).init_lane(lane, config);
    }

    fn set_enabled(&mut self, lane: LaneId, enabled: bool) {
        (**self).set_enabled(lane, enabled);
    }

    fn clear_fifos(&mut self, lane: LaneId) {
        (**self).clear_fifos(lane);
    }

    fn rx_level(&self, lane: LaneId) -> usize {
        (**self).rx_level(lane)
    }

    fn rx_is_empty(&self, lane: LaneId) -> bool {
        (**self).rx_is_empty(lane)
    }

    fn rx_pop(&mut self, lane: LaneId) -> Option<u32> {
        (**self).rx_pop(lane)
    }

    fn tx_is_full(&self, lane: LaneId) -> bool {
        (**self).tx_is_full(lane)
    }

    fn tx_push_blocking(&mut self, lane: LaneId, word: u32) {
        (**self).tx_push_blocking(lane, word);
    }
}
