//! RP2040 PIO Backend
//!
//! Implements [`Coprocessor`] directly on the PIO, IO bank and pad registers
//! through the embassy-rp PAC. Lanes and pins are picked at runtime, which
//! the typed `embassy_rp::pio` API does not allow, so the state machines are
//! programmed the way the SDK does it: register writes plus forced
//! instructions.
//!
//! The driver owns the whole block. Do not hand the same block to
//! `embassy_rp::pio::Pio` as well.

use embassy_rp::pac;
use embassy_rp::peripherals::{PIO0, PIO1};

use crate::config::FUNCSEL_NULL;
use crate::coprocessor::{Coprocessor, FifoJoin, LaneConfig, ShiftConfig, ShiftDirection};
use crate::error::Result;
use crate::lanes::LaneAllocator;
use crate::program::{InstructionMemory, ProgramAsset};
use crate::types::{LaneId, PinId, PioInstance};

/// `set pins, <value>`
const SET_PINS: u16 = 0xe000;

/// `set pindirs, <value>`
const SET_PINDIRS: u16 = 0xe080;

/// `jmp <addr>`
const JMP: u16 = 0x0000;

/// Bits of the FLEVEL register per lane
const FLEVEL_STRIDE: usize = 8;

/// Offset of the RX level within a lane's FLEVEL byte
const FLEVEL_RX_SHIFT: usize = 4;

/// Hardware PIO block
pub struct RpCoprocessor {
    instance: PioInstance,
    memory: InstructionMemory,
}

impl RpCoprocessor {
    /// Take over PIO0
    #[must_use]
    pub fn pio0(_pio: PIO0) -> Self {
        Self::new(PioInstance::Pio0)
    }

    /// Take over PIO1
    #[must_use]
    pub fn pio1(_pio: PIO1) -> Self {
        Self::new(PioInstance::Pio1)
    }

    fn new(instance: PioInstance) -> Self {
        // Bring the block out of reset
        pac::RESETS.reset().modify(|w| match instance {
            PioInstance::Pio0 => w.set_pio0(false),
            PioInstance::Pio1 => w.set_pio1(false),
        });
        loop {
            let done = pac::RESETS.reset_done().read();
            let ready = match instance {
                PioInstance::Pio0 => done.pio0(),
                PioInstance::Pio1 => done.pio1(),
            };
            if ready {
                break;
            }
        }

        let cop = Self {
            instance,
            memory: InstructionMemory::new(),
        };
        // Stop every lane; lane claims live in the static allocator and are untouched
        cop.regs().ctrl().write(|w| w.set_sm_enable(0));
        debug!("PIO{} ready", instance.index());
        cop
    }

    fn regs(&self) -> pac::pio::Pio {
        match self.instance {
            PioInstance::Pio0 => pac::PIO0,
            PioInstance::Pio1 => pac::PIO1,
        }
    }

    /// Run `instr` on `lane` immediately
    fn exec(&self, lane: LaneId, instr: u16) {
        self.regs().sm(lane.index()).instr().write(|w| w.set_instr(instr));
    }

    /// Run a `set` instruction targeting `pin` only
    ///
    /// The lane's SET mapping is borrowed for the duration and restored.
    fn exec_set(&self, lane: LaneId, pin: PinId, instr: u16) {
        let sm = self.regs().sm(lane.index());
        let saved = sm.pinctrl().read();
        sm.pinctrl().write(|w| {
            w.set_set_base(pin.number());
            w.set_set_count(1);
        });
        self.exec(lane, instr);
        sm.pinctrl().write_value(saved);
    }
}

const fn shift_right(shift: &ShiftConfig) -> bool {
    matches!(shift.direction, ShiftDirection::Right)
}

/// Thresholds of 32 are encoded as 0
const fn threshold_bits(shift: &ShiftConfig) -> u8 {
    shift.threshold & 0x1f
}

impl Coprocessor for RpCoprocessor {
    fn instance(&self) -> PioInstance {
        self.instance
    }

    fn clock_hz(&self) -> u32 {
        embassy_rp::clocks::clk_sys_freq()
    }

    fn lanes(&self) -> &LaneAllocator {
        LaneAllocator::for_instance(self.instance)
    }

    fn add_program(&mut self, program: &ProgramAsset) -> Result<u8> {
        let offset = self.memory.allocate(program)?;
        let pio = self.regs();
        for (addr, word) in (usize::from(offset)..).zip(program.relocated(offset)) {
            pio.instr_mem(addr).write(|w| w.set_instr_mem(word));
        }
        debug!("loaded {} at {}", program.name, offset);
        Ok(offset)
    }

    fn remove_program(&mut self, program: &ProgramAsset, offset: u8) {
        self.memory.release(program, offset);
        debug!("released {} at {}", program.name, offset);
    }

    fn set_pin_dir(&mut self, lane: LaneId, pin: PinId, output: bool) {
        self.exec_set(lane, pin, SET_PINDIRS | u16::from(output));
    }

    fn set_pin_level(&mut self, lane: LaneId, pin: PinId, high: bool) {
        self.exec_set(lane, pin, SET_PINS | u16::from(high));
    }

    fn gpio_init(&mut self, pin: PinId) {
        pac::PADS_BANK0.gpio(pin.index()).modify(|w| {
            w.set_ie(true);
            w.set_od(false);
        });
        pac::IO_BANK0
            .gpio(pin.index())
            .ctrl()
            .write(|w| w.set_funcsel(self.instance.funcsel()));
    }

    fn gpio_deinit(&mut self, pin: PinId) {
        pac::IO_BANK0
            .gpio(pin.index())
            .ctrl()
            .write(|w| w.set_funcsel(FUNCSEL_NULL));
    }

    fn set_pull_up(&mut self, pin: PinId, enabled: bool) {
        pac::PADS_BANK0.gpio(pin.index()).modify(|w| {
            w.set_pue(enabled);
            w.set_pde(false);
        });
    }

    fn init_lane(&mut self, lane: LaneId, config: &LaneConfig) {
        let pio = self.regs();
        let sm = pio.sm(lane.index());
        self.set_enabled(lane, false);

        let (int, frac) = config.clock_divider.register_fields();
        sm.clkdiv().write(|w| {
            w.set_int(int);
            w.set_frac(frac);
        });

        sm.execctrl().write(|w| {
            w.set_wrap_bottom(config.wrap_target);
            w.set_wrap_top(config.wrap);
            w.set_side_en(config.side_set.optional);
            w.set_side_pindir(config.side_set.pindirs);
            w.set_jmp_pin(config.jmp_pin.map_or(0, PinId::number));
        });

        sm.shiftctrl().write(|w| {
            w.set_in_shiftdir(shift_right(&config.in_shift));
            w.set_autopush(config.in_shift.auto);
            w.set_push_thresh(threshold_bits(&config.in_shift));
            w.set_out_shiftdir(shift_right(&config.out_shift));
            w.set_autopull(config.out_shift.auto);
            w.set_pull_thresh(threshold_bits(&config.out_shift));
            w.set_fjoin_rx(config.fifo_join == FifoJoin::RxOnly);
            w.set_fjoin_tx(config.fifo_join == FifoJoin::TxOnly);
        });

        sm.pinctrl().write(|w| {
            w.set_sideset_count(config.side_set.bits);
            w.set_sideset_base(config.sideset_base.map_or(0, PinId::number));
            w.set_out_base(config.out_base.map_or(0, PinId::number));
            w.set_out_count(config.out_count);
            w.set_in_base(config.in_base.map_or(0, PinId::number));
        });

        self.clear_fifos(lane);
        pio.ctrl().modify(|w| {
            w.set_sm_restart(lane.mask());
            w.set_clkdiv_restart(lane.mask());
        });
        self.exec(lane, JMP | u16::from(config.origin));
        trace!("{} configured, origin {}", lane, config.origin);
    }

    fn set_enabled(&mut self, lane: LaneId, enabled: bool) {
        self.regs().ctrl().modify(|w| {
            let mask = w.sm_enable();
            w.set_sm_enable(if enabled { mask | lane.mask() } else { mask & !lane.mask() });
        });
    }

    fn clear_fifos(&mut self, lane: LaneId) {
        let sm = self.regs().sm(lane.index());
        // Toggling a join bit flushes both FIFOs
        sm.shiftctrl().modify(|w| w.set_fjoin_rx(!w.fjoin_rx()));
        sm.shiftctrl().modify(|w| w.set_fjoin_rx(!w.fjoin_rx()));
    }

    fn rx_level(&self, lane: LaneId) -> usize {
        let flevel = self.regs().flevel().read().0;
        ((flevel >> (lane.index() * FLEVEL_STRIDE + FLEVEL_RX_SHIFT)) & 0x0f) as usize
    }

    fn rx_is_empty(&self, lane: LaneId) -> bool {
        self.regs().fstat().read().rxempty() & lane.mask() != 0
    }

    fn rx_pop(&mut self, lane: LaneId) -> Option<u32> {
        if self.rx_is_empty(lane) {
            return None;
        }
        Some(self.regs().rxf(lane.index()).read())
    }

    fn tx_is_full(&self, lane: LaneId) -> bool {
        self.regs().fstat().read().txfull() & lane.mask() != 0
    }

    fn tx_push_blocking(&mut self, lane: LaneId, word: u32) {
        while self.tx_is_full(lane) {
            core::hint::spin_loop();
        }
        self.regs().txf(lane.index()).write_value(word);
    }
}
