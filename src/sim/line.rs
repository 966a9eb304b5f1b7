//! Wire-level helpers: frame encoding, the frame sampler shared by RX lanes
//! and monitors, and external line drivers.

use heapless::{Deque, Vec};

use crate::config::{DATA_BITS, FRAME_BITS, OVERSAMPLE_FACTOR};
use crate::coprocessor::ShiftDirection;
use crate::types::PinId;

/// Lane cycles per bit
pub const BIT_CYCLES: u8 = OVERSAMPLE_FACTOR as u8;

/// Lane cycles per 8N1 frame
pub const FRAME_CYCLES: u64 = (FRAME_BITS * OVERSAMPLE_FACTOR) as u64;

/// Cycles from the falling edge to the first data sample: one cycle for
/// `wait`, then `set x, 7 [10]` lands mid-way through bit 0
const FIRST_SAMPLE_DELAY: u8 = 12;

/// Frames an external line can queue
pub const LINE_QUEUE_DEPTH: usize = 64;

/// Bytes a monitor records
pub const MONITOR_CAPACITY: usize = 512;

/// 10-bit 8N1 frame for `byte`, bit 0 goes on the wire first
#[must_use]
pub const fn encode_frame(byte: u8) -> u16 {
    (1 << 9) | ((byte as u16) << 1)
}

/// Shift one bit into an ISR
pub(crate) const fn shift_in(isr: u32, bit: bool, direction: ShiftDirection) -> u32 {
    match direction {
        ShiftDirection::Right => (isr >> 1) | ((bit as u32) << 31),
        ShiftDirection::Left => (isr << 1) | bit as u32,
    }
}

/// Shift one bit out of an OSR
pub(crate) fn shift_out(osr: &mut u32, direction: ShiftDirection) -> bool {
    match direction {
        ShiftDirection::Right => {
            let bit = *osr & 1 != 0;
            *osr >>= 1;
            bit
        }
        ShiftDirection::Left => {
            let bit = *osr & 0x8000_0000 != 0;
            *osr <<= 1;
            bit
        }
    }
}

/// Outcome of one sampled frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sampled {
    /// Stop bit high, ISR contents
    Word(u32),
    /// Stop bit low, frame discarded
    FramingError,
}

#[derive(Clone, Copy, Debug, Default)]
enum SamplerState {
    #[default]
    WaitStart,
    Bits {
        countdown: u8,
        bits: u8,
        isr: u32,
    },
    WaitIdle,
}

/// Cycle-stepped model of the RX program's sampling loop
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Sampler {
    state: SamplerState,
}

impl Sampler {
    /// Sampler that ignores the line until it first reads idle
    pub(crate) const fn idle() -> Self {
        Self {
            state: SamplerState::WaitIdle,
        }
    }

    /// Advance one cycle; `data` is the IN pin level, `stop` the JMP pin level
    pub(crate) fn step(&mut self, data: bool, stop: bool, direction: ShiftDirection) -> Option<Sampled> {
        match self.state {
            SamplerState::WaitStart => {
                if !data {
                    self.state = SamplerState::Bits {
                        countdown: FIRST_SAMPLE_DELAY,
                        bits: 0,
                        isr: 0,
                    };
                }
                None
            }
            SamplerState::WaitIdle => {
                if data {
                    self.state = SamplerState::WaitStart;
                }
                None
            }
            SamplerState::Bits { countdown, bits, isr } => {
                let countdown = countdown - 1;
                if countdown > 0 {
                    self.state = SamplerState::Bits { countdown, bits, isr };
                    return None;
                }
                if u32::from(bits) < DATA_BITS {
                    self.state = SamplerState::Bits {
                        countdown: BIT_CYCLES,
                        bits: bits + 1,
                        isr: shift_in(isr, data, direction),
                    };
                    return None;
                }
                if stop {
                    self.state = SamplerState::WaitStart;
                    Some(Sampled::Word(isr))
                } else {
                    self.state = SamplerState::WaitIdle;
                    Some(Sampled::FramingError)
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FrameCursor {
    frame: u16,
    bit: u8,
    countdown: u8,
}

/// A peer driving a pin: idle high, queued frames at 8 cycles per bit
#[derive(Debug)]
pub(crate) struct ExternalLine {
    pin: PinId,
    frames: Deque<u16, LINE_QUEUE_DEPTH>,
    current: Option<FrameCursor>,
}

impl ExternalLine {
    pub(crate) const fn new(pin: PinId) -> Self {
        Self {
            pin,
            frames: Deque::new(),
            current: None,
        }
    }

    pub(crate) const fn pin(&self) -> PinId {
        self.pin
    }

    /// Queue a raw 10-bit frame; false if the queue is full
    pub(crate) fn push(&mut self, frame: u16) -> bool {
        self.frames.push_back(frame).is_ok()
    }

    /// Whether every queued frame has been sent
    pub(crate) fn is_idle(&self) -> bool {
        self.current.is_none() && self.frames.is_empty()
    }

    pub(crate) fn level(&self) -> bool {
        self.current
            .map_or(true, |cursor| (cursor.frame >> cursor.bit) & 1 != 0)
    }

    pub(crate) fn step(&mut self) {
        if let Some(cursor) = &mut self.current {
            cursor.countdown -= 1;
            if cursor.countdown > 0 {
                return;
            }
            cursor.bit += 1;
            cursor.countdown = BIT_CYCLES;
            if u32::from(cursor.bit) < FRAME_BITS {
                return;
            }
            self.current = None;
        }
        self.current = self.frames.pop_front().map(|frame| FrameCursor {
            frame,
            bit: 0,
            countdown: BIT_CYCLES,
        });
    }
}

/// Passive decoder attached to a pin
#[derive(Debug)]
pub(crate) struct Monitor {
    pin: PinId,
    sampler: Sampler,
    last_level: bool,
    bytes: Vec<u8, MONITOR_CAPACITY>,
    framing_errors: u32,
    falling_edges: u32,
}

impl Monitor {
    pub(crate) fn new(pin: PinId, level: bool) -> Self {
        Self {
            pin,
            sampler: Sampler::idle(),
            last_level: level,
            bytes: Vec::new(),
            framing_errors: 0,
            falling_edges: 0,
        }
    }

    pub(crate) const fn pin(&self) -> PinId {
        self.pin
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) const fn framing_errors(&self) -> u32 {
        self.framing_errors
    }

    pub(crate) const fn falling_edges(&self) -> u32 {
        self.falling_edges
    }

    pub(crate) fn step(&mut self, level: bool) {
        if self.last_level && !level {
            self.falling_edges += 1;
        }
        self.last_level = level;

        match self.sampler.step(level, level, ShiftDirection::Right) {
            Some(Sampled::Word(word)) => {
                let _ = self.bytes.push((word >> 24) as u8);
            }
            Some(Sampled::FramingError) => self.framing_errors += 1,
            None => {}
        }
    }
}
