//! Simulated state machine running one of the two serial programs.

use heapless::Deque;

use super::line::{shift_out, Sampled, Sampler, BIT_CYCLES};
use super::SimPin;
use crate::config::{FIFO_DEPTH, JOINED_FIFO_DEPTH, NUM_GPIOS};
use crate::coprocessor::{FifoJoin, LaneConfig};
use crate::types::PinId;

/// Program a lane was pointed at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LaneProgram {
    Receiver,
    Transmitter,
    Unknown,
}

/// Bit slots of one transmitted word: the high slot after `pull`, the start
/// bit, then 8 data bits
const TX_SLOTS: u8 = 10;

#[derive(Clone, Copy, Debug)]
enum TxPhase {
    Pull,
    Slot { index: u8, countdown: u8 },
}

#[derive(Clone, Copy, Debug)]
enum Role {
    Idle,
    Receiver { sampler: Sampler, holding: Option<u32> },
    Transmitter { phase: TxPhase, osr: u32 },
}

#[derive(Debug)]
pub(crate) struct SimLane {
    config: Option<LaneConfig>,
    enabled: bool,
    role: Role,
    rx_fifo: Deque<u32, JOINED_FIFO_DEPTH>,
    tx_fifo: Deque<u32, JOINED_FIFO_DEPTH>,
    framing_errors: u32,
}

fn drive(pins: &mut [SimPin; NUM_GPIOS], pin: Option<PinId>, high: bool) {
    if let Some(pin) = pin {
        pins[pin.index()].output_high = high;
    }
}

fn level(levels: &[bool; NUM_GPIOS], pin: Option<PinId>) -> bool {
    // Unmapped pin fields reset to GPIO 0
    levels[pin.map_or(0, PinId::index)]
}

impl SimLane {
    pub(crate) fn new() -> Self {
        Self {
            config: None,
            enabled: false,
            role: Role::Idle,
            rx_fifo: Deque::new(),
            tx_fifo: Deque::new(),
            framing_errors: 0,
        }
    }

    pub(crate) const fn config(&self) -> Option<&LaneConfig> {
        self.config.as_ref()
    }

    pub(crate) const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) const fn framing_errors(&self) -> u32 {
        self.framing_errors
    }

    /// Load a configuration; the lane restarts from its origin, disabled
    pub(crate) fn init(&mut self, config: LaneConfig, program: LaneProgram) {
        self.config = Some(config);
        self.enabled = false;
        self.role = match program {
            LaneProgram::Receiver => Role::Receiver {
                sampler: Sampler::default(),
                holding: None,
            },
            LaneProgram::Transmitter => Role::Transmitter {
                phase: TxPhase::Pull,
                osr: 0,
            },
            LaneProgram::Unknown => Role::Idle,
        };
        self.clear_fifos();
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn clear_fifos(&mut self) {
        self.rx_fifo.clear();
        self.tx_fifo.clear();
    }

    fn join(&self) -> FifoJoin {
        self.config.map_or(FifoJoin::Duplex, |config| config.fifo_join)
    }

    pub(crate) fn rx_depth(&self) -> usize {
        match self.join() {
            FifoJoin::Duplex => FIFO_DEPTH,
            FifoJoin::RxOnly => JOINED_FIFO_DEPTH,
            FifoJoin::TxOnly => 0,
        }
    }

    pub(crate) fn tx_depth(&self) -> usize {
        match self.join() {
            FifoJoin::Duplex => FIFO_DEPTH,
            FifoJoin::TxOnly => JOINED_FIFO_DEPTH,
            FifoJoin::RxOnly => 0,
        }
    }

    pub(crate) fn rx_level(&self) -> usize {
        self.rx_fifo.len()
    }

    pub(crate) fn rx_pop(&mut self) -> Option<u32> {
        self.rx_fifo.pop_front()
    }

    pub(crate) fn tx_level(&self) -> usize {
        self.tx_fifo.len()
    }

    pub(crate) fn tx_is_full(&self) -> bool {
        self.tx_fifo.len() >= self.tx_depth()
    }

    /// Queue a word; the caller checks `tx_is_full` first
    pub(crate) fn tx_push(&mut self, word: u32) {
        if !self.tx_is_full() {
            let _ = self.tx_fifo.push_back(word);
        }
    }

    fn try_push_rx(&mut self, word: u32) -> bool {
        if self.rx_fifo.len() < self.rx_depth() {
            self.rx_fifo.push_back(word).is_ok()
        } else {
            false
        }
    }

    /// Advance one lane cycle
    pub(crate) fn step(&mut self, levels: &[bool; NUM_GPIOS], pins: &mut [SimPin; NUM_GPIOS]) {
        if !self.enabled {
            return;
        }
        let Some(config) = self.config else {
            return;
        };

        match self.role {
            Role::Idle => {}
            Role::Receiver { mut sampler, holding } => {
                // `push block` stalls the lane until the FIFO has room
                if let Some(word) = holding {
                    let holding = if self.try_push_rx(word) { None } else { Some(word) };
                    self.role = Role::Receiver { sampler, holding };
                    return;
                }

                let data = level(levels, config.in_base);
                let stop = level(levels, config.jmp_pin);
                let holding = match sampler.step(data, stop, config.in_shift.direction) {
                    Some(Sampled::Word(word)) if !self.try_push_rx(word) => Some(word),
                    Some(Sampled::FramingError) => {
                        self.framing_errors += 1;
                        None
                    }
                    _ => None,
                };
                self.role = Role::Receiver { sampler, holding };
            }
            Role::Transmitter { phase, mut osr } => {
                let sideset = if config.side_set.bits > 0 {
                    config.sideset_base
                } else {
                    None
                };

                if let TxPhase::Slot { index, countdown } = phase {
                    let countdown = countdown - 1;
                    if countdown > 0 {
                        self.role = Role::Transmitter {
                            phase: TxPhase::Slot { index, countdown },
                            osr,
                        };
                        return;
                    }
                    if index + 1 < TX_SLOTS {
                        let index = index + 1;
                        if index == 1 {
                            // set x, 7 side 0: start bit
                            drive(pins, sideset, false);
                        } else {
                            let bit = shift_out(&mut osr, config.out_shift.direction);
                            drive(pins, config.out_base, bit);
                        }
                        self.role = Role::Transmitter {
                            phase: TxPhase::Slot {
                                index,
                                countdown: BIT_CYCLES,
                            },
                            osr,
                        };
                        return;
                    }
                }

                // pull side 1: the line goes high while the lane waits
                drive(pins, sideset, true);
                let phase = match self.tx_fifo.pop_front() {
                    Some(word) => {
                        osr = word;
                        TxPhase::Slot {
                            index: 0,
                            countdown: BIT_CYCLES,
                        }
                    }
                    None => TxPhase::Pull,
                };
                self.role = Role::Transmitter { phase, osr };
            }
        }
    }
}
