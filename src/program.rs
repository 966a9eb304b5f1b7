//! Bit-stream Programs
//!
//! The two lane programs are fixed, pre-assembled assets. The driver never
//! inspects their instructions; it only relies on the contract documented
//! on each asset (pin roles, shift direction, FIFO join, cycles per bit).
//!
//! # RX contract (`UART_RX`)
//!
//! - IN base and JMP pin are both the line pin
//! - waits for a falling edge, samples 8 bits mid-bit, right-shifting into
//!   the ISR, so the byte lands in bits 31..24 of the pushed word
//! - checks the stop bit through the JMP pin; a low stop bit raises relative
//!   IRQ 4, waits for the line to go idle and discards the byte
//! - `push block`: a full RX FIFO stalls the lane holding the byte
//! - 8 cycles per bit
//!
//! # TX contract (`UART_TX`)
//!
//! - OUT base and side-set base are both the line pin, one optional
//!   side-set bit
//! - `pull` (blocking) with side-set 1: idle and stop bit are high
//! - start bit through side-set 0, then 8 data bits through OUT, LSB first
//!   from a right-shifting OSR
//! - 8 cycles per bit

use crate::config::INSTRUCTION_MEMORY_SIZE;
use crate::error::{Error, Result};

/// Side-set configuration of a program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SideSet {
    /// Side-set bits, including the enable bit when optional
    pub bits: u8,
    /// Whether side-set is optional per instruction
    pub optional: bool,
    /// Side-set drives pin directions instead of levels
    pub pindirs: bool,
}

impl SideSet {
    /// No side-set
    pub const NONE: Self = Self {
        bits: 0,
        optional: false,
        pindirs: false,
    };
}

/// Pre-assembled lane program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramAsset {
    /// Program name
    pub name: &'static str,
    /// Asset revision
    pub version: u16,
    /// Instruction words, unrelocated
    pub code: &'static [u16],
    /// Wrap target, relative to the load offset
    pub wrap_target: u8,
    /// Wrap source (last instruction), relative to the load offset
    pub wrap: u8,
    /// Side-set configuration
    pub side_set: SideSet,
}

/// Receiver: 8N1, 8 cycles per bit, stop bit checked
pub const UART_RX: ProgramAsset = ProgramAsset {
    name: "uart_rx",
    version: 1,
    code: &[
        0x2020, // wait 0 pin 0
        0xea27, // set x, 7 [10]
        0x4001, // in pins, 1
        0x0642, // jmp x-- 2 [6]
        0x00c8, // jmp pin 8
        0xc014, // irq nowait 4 rel
        0x20a0, // wait 1 pin 0
        0x0000, // jmp 0
        0x8020, // push block
    ],
    wrap_target: 0,
    wrap: 8,
    side_set: SideSet::NONE,
};

/// Transmitter: 8N1, 8 cycles per bit
pub const UART_TX: ProgramAsset = ProgramAsset {
    name: "uart_tx",
    version: 1,
    code: &[
        0x9fa0, // pull block side 1 [7]
        0xf727, // set x, 7 side 0 [7]
        0x6001, // out pins, 1
        0x0642, // jmp x-- 2 [6]
    ],
    wrap_target: 0,
    wrap: 3,
    side_set: SideSet {
        bits: 2,
        optional: true,
        pindirs: false,
    },
};

/// Mask of the opcode field
const OPCODE_MASK: u16 = 0xe000;

/// JMP opcode
const OPCODE_JMP: u16 = 0x0000;

/// Mask of a JMP target address
const JMP_ADDR_MASK: u16 = 0x001f;

impl ProgramAsset {
    /// Number of instruction slots the program needs
    #[must_use]
    pub const fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether the program has no instructions
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Slot mask the program occupies when loaded at `offset`
    #[must_use]
    pub fn slot_mask(&self, offset: u8) -> u32 {
        let ones = if self.len() >= 32 {
            u32::MAX
        } else {
            (1u32 << self.len()) - 1
        };
        ones << offset
    }

    /// Instruction words relocated for loading at `offset`
    ///
    /// JMP targets are absolute, so they move with the program.
    pub fn relocated(&self, offset: u8) -> impl Iterator<Item = u16> + '_ {
        self.code.iter().map(move |&instr| {
            if instr & OPCODE_MASK == OPCODE_JMP {
                let target = (instr & JMP_ADDR_MASK) + u16::from(offset);
                (instr & !JMP_ADDR_MASK) | (target & JMP_ADDR_MASK)
            } else {
                instr
            }
        })
    }
}

/// Slot bookkeeping for a block's 32-word instruction memory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstructionMemory {
    used: u32,
}

impl InstructionMemory {
    /// Empty instruction memory
    #[must_use]
    pub const fn new() -> Self {
        Self { used: 0 }
    }

    /// Bitmap of occupied slots
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.used
    }

    /// Number of free slots
    #[must_use]
    pub const fn free_slots(&self) -> u32 {
        self.used.count_zeros()
    }

    /// Find the highest offset where `program` fits
    ///
    /// Programs are packed from the top of memory down, leaving low
    /// addresses for programs with a fixed origin.
    #[must_use]
    pub fn find_offset(&self, program: &ProgramAsset) -> Option<u8> {
        if program.is_empty() || program.len() > INSTRUCTION_MEMORY_SIZE {
            return None;
        }
        let last = INSTRUCTION_MEMORY_SIZE - program.len();
        (0..=last)
            .rev()
            .map(|offset| offset as u8)
            .find(|&offset| self.used & program.slot_mask(offset) == 0)
    }

    /// Reserve slots for `program`, returning its offset
    pub fn allocate(&mut self, program: &ProgramAsset) -> Result<u8> {
        let offset = self.find_offset(program).ok_or(Error::ProgramSpace)?;
        self.used |= program.slot_mask(offset);
        Ok(offset)
    }

    /// Release the slots of `program` loaded at `offset`
    pub fn release(&mut self, program: &ProgramAsset, offset: u8) {
        self.used &= !program.slot_mask(offset);
    }
}
