//! PIO Simulator
//!
//! Cycle-stepped model of one PIO block and the pins around it, used to run
//! the driver on the host. Lanes execute the behaviour of the two serial
//! programs rather than decoding instructions; one simulator cycle is one
//! lane cycle, so a bit is [`BIT_CYCLES`] steps whatever the divider says.
//!
//! Outside the block the simulator offers:
//!
//! - external lines that drive a pin with queued frames ([`SimCoprocessor::send`])
//! - monitors that decode whatever appears on a pin ([`SimCoprocessor::monitor`])
//! - jumper wires between pins ([`SimCoprocessor::connect`])
//!
//! ```ignore
//! let mut sim = SimCoprocessor::new(PioInstance::Pio0);
//! sim.connect(PinId::GP4, PinId::GP5);
//! let mut serial = SoftwareSerial::new(&mut sim, Some(PinId::GP4), Some(PinId::GP5));
//! serial.start(115_200)?;
//! serial.write(0x42)?;
//! serial.coprocessor_mut().run_frames(2);
//! assert_eq!(serial.read()?, Some(0x42));
//! ```

mod lane;
mod line;

use heapless::Vec;

use self::lane::{LaneProgram, SimLane};
use self::line::{ExternalLine, Monitor};
use crate::config::{INSTRUCTION_MEMORY_SIZE, LANES_PER_INSTANCE, NUM_GPIOS, SYSTEM_CLOCK_HZ};
use crate::coprocessor::{Coprocessor, LaneConfig};
use crate::error::{Error, Result};
use crate::lanes::LaneAllocator;
use crate::program::{InstructionMemory, ProgramAsset, UART_RX, UART_TX};
use crate::types::{LaneId, PinId, PioInstance};

pub use self::line::{encode_frame, BIT_CYCLES, FRAME_CYCLES};

/// Cycles `tx_push_blocking` waits for a free slot before giving up
pub const STALL_LIMIT: u64 = 1_000_000;

/// Programs loaded at once; the smallest asset is 4 words
const MAX_PROGRAMS: usize = INSTRUCTION_MEMORY_SIZE / 4;

/// External lines and monitors per simulator
const MAX_ATTACHMENTS: usize = 4;

/// Jumper wires per simulator
const MAX_JUMPERS: usize = 8;

/// Peripheral a pin is routed to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinFunction {
    /// Not routed; the pad floats to its pull
    #[default]
    Null,
    /// Routed to a PIO block
    Pio(PioInstance),
}

/// Pad and output state of one GPIO
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimPin {
    /// Function select
    pub function: PinFunction,
    /// Pad pull-up
    pub pull_up: bool,
    /// Output enable as set by the block
    pub output_enable: bool,
    /// Output level as set by the block
    pub output_high: bool,
}

/// Simulated PIO block
pub struct SimCoprocessor {
    instance: PioInstance,
    clock_hz: u32,
    claims: LaneAllocator,
    memory: InstructionMemory,
    instr: [u16; INSTRUCTION_MEMORY_SIZE],
    loaded: Vec<(u8, ProgramAsset), MAX_PROGRAMS>,
    machines: [SimLane; LANES_PER_INSTANCE],
    pins: [SimPin; NUM_GPIOS],
    forced_lows: [u32; NUM_GPIOS],
    jumpers: Vec<(PinId, PinId), MAX_JUMPERS>,
    lines: Vec<ExternalLine, MAX_ATTACHMENTS>,
    monitors: Vec<Monitor, MAX_ATTACHMENTS>,
    cycle: u64,
}

impl SimCoprocessor {
    /// Block at the default system clock, every lane free
    #[must_use]
    pub fn new(instance: PioInstance) -> Self {
        Self::with_clock(instance, SYSTEM_CLOCK_HZ)
    }

    /// Block fed by a `clock_hz` clock
    #[must_use]
    pub fn with_clock(instance: PioInstance, clock_hz: u32) -> Self {
        Self {
            instance,
            clock_hz,
            claims: LaneAllocator::new(),
            memory: InstructionMemory::new(),
            instr: [0; INSTRUCTION_MEMORY_SIZE],
            loaded: Vec::new(),
            machines: core::array::from_fn(|_| SimLane::new()),
            pins: [SimPin::default(); NUM_GPIOS],
            forced_lows: [0; NUM_GPIOS],
            jumpers: Vec::new(),
            lines: Vec::new(),
            monitors: Vec::new(),
            cycle: 0,
        }
    }

    // ========================================================================
    // Wiring
    // ========================================================================

    /// Wire `from` to `to`: while the block drives `from`, `to` follows it
    ///
    /// Returns false if no more jumpers fit.
    pub fn connect(&mut self, from: PinId, to: PinId) -> bool {
        self.jumpers.push((from, to)).is_ok()
    }

    fn line_index(&mut self, pin: PinId) -> Option<usize> {
        if let Some(index) = self.lines.iter().position(|line| line.pin() == pin) {
            return Some(index);
        }
        self.lines.push(ExternalLine::new(pin)).ok()?;
        Some(self.lines.len() - 1)
    }

    /// Queue 8N1 frames for `bytes` on an external line driving `pin`
    ///
    /// Returns how many bytes were queued.
    pub fn send(&mut self, pin: PinId, bytes: &[u8]) -> usize {
        let Some(index) = self.line_index(pin) else {
            return 0;
        };
        let line = &mut self.lines[index];
        bytes
            .iter()
            .take_while(|&&byte| line.push(encode_frame(byte)))
            .count()
    }

    /// Queue a raw 10-bit frame, bit 0 first, on an external line driving `pin`
    pub fn send_frame(&mut self, pin: PinId, frame: u16) -> bool {
        match self.line_index(pin) {
            Some(index) => self.lines[index].push(frame),
            None => false,
        }
    }

    /// Whether the external line on `pin` has sent everything queued
    #[must_use]
    pub fn line_idle(&self, pin: PinId) -> bool {
        self.lines
            .iter()
            .find(|line| line.pin() == pin)
            .map_or(true, ExternalLine::is_idle)
    }

    /// Start decoding frames that appear on `pin`
    pub fn monitor(&mut self, pin: PinId) -> bool {
        if self.monitors.iter().any(|monitor| monitor.pin() == pin) {
            return true;
        }
        let level = self.level(pin);
        self.monitors.push(Monitor::new(pin, level)).is_ok()
    }

    fn find_monitor(&self, pin: PinId) -> Option<&Monitor> {
        self.monitors.iter().find(|monitor| monitor.pin() == pin)
    }

    /// Bytes decoded on a monitored pin
    #[must_use]
    pub fn received(&self, pin: PinId) -> &[u8] {
        self.find_monitor(pin).map_or(&[][..], Monitor::bytes)
    }

    /// Frames with a low stop bit seen on a monitored pin
    #[must_use]
    pub fn monitor_framing_errors(&self, pin: PinId) -> u32 {
        self.find_monitor(pin).map_or(0, Monitor::framing_errors)
    }

    /// High-to-low transitions seen on a monitored pin
    #[must_use]
    pub fn falling_edges(&self, pin: PinId) -> u32 {
        self.find_monitor(pin).map_or(0, Monitor::falling_edges)
    }

    // ========================================================================
    // Time
    // ========================================================================

    fn driven_level(&self, index: usize) -> Option<bool> {
        let pin = &self.pins[index];
        (pin.function == PinFunction::Pio(self.instance) && pin.output_enable).then_some(pin.output_high)
    }

    fn level_at(&self, index: usize) -> bool {
        if let Some(line) = self.lines.iter().find(|line| line.pin().index() == index) {
            return line.level();
        }
        if let Some(level) = self.driven_level(index) {
            return level;
        }
        self.jumpers
            .iter()
            .filter(|(_, to)| to.index() == index)
            .find_map(|(from, _)| self.driven_level(from.index()))
            .unwrap_or(self.pins[index].pull_up)
    }

    /// Apply a pad or mux change to `pin`, counting it if the block starts
    /// driving the pin low
    fn reconfigure_pin(&mut self, pin: PinId, change: impl FnOnce(&mut SimPin)) {
        let index = pin.index();
        let before = self.driven_level(index);
        change(&mut self.pins[index]);
        if before != Some(false) && self.driven_level(index) == Some(false) {
            self.forced_lows[index] += 1;
        }
    }

    /// Current level of `pin`
    ///
    /// An external line wins, then the block's own output, then a jumper
    /// from a driven pin, then the pull-up. Undriven pins without a pull-up
    /// read low.
    #[must_use]
    pub fn level(&self, pin: PinId) -> bool {
        self.level_at(pin.index())
    }

    /// Advance one lane cycle
    pub fn step(&mut self) {
        for line in &mut self.lines {
            line.step();
        }

        let levels: [bool; NUM_GPIOS] = core::array::from_fn(|index| self.level_at(index));

        for monitor in &mut self.monitors {
            monitor.step(levels[monitor.pin().index()]);
        }

        let Self { machines, pins, .. } = self;
        for machine in machines.iter_mut() {
            machine.step(&levels, pins);
        }

        self.cycle += 1;
    }

    /// Advance `cycles` lane cycles
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Advance the time `frames` 8N1 frames take on the wire
    pub fn run_frames(&mut self, frames: u64) {
        self.run(frames * FRAME_CYCLES);
    }

    /// Times a configuration call left `pin` actively driven low
    ///
    /// Lane activity on the pin is not counted, only `gpio_init`,
    /// `set_pin_dir` and `set_pin_level`.
    #[must_use]
    pub fn forced_lows(&self, pin: PinId) -> u32 {
        self.forced_lows[pin.index()]
    }

    /// Cycles since construction
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Pad state of `pin`
    #[must_use]
    pub fn pin(&self, pin: PinId) -> SimPin {
        self.pins[pin.index()]
    }

    /// Configuration last applied to `lane`
    #[must_use]
    pub fn lane_config(&self, lane: LaneId) -> Option<LaneConfig> {
        self.machines[lane.index()].config().copied()
    }

    /// Whether `lane` is running
    #[must_use]
    pub fn is_enabled(&self, lane: LaneId) -> bool {
        self.machines[lane.index()].is_enabled()
    }

    /// Frames `lane` discarded for a low stop bit
    #[must_use]
    pub fn framing_errors(&self, lane: LaneId) -> u32 {
        self.machines[lane.index()].framing_errors()
    }

    /// Words waiting in the TX FIFO of `lane`
    #[must_use]
    pub fn tx_level(&self, lane: LaneId) -> usize {
        self.machines[lane.index()].tx_level()
    }

    /// Instruction word at `addr`
    #[must_use]
    pub fn instruction(&self, addr: u8) -> u16 {
        self.instr[usize::from(addr) % INSTRUCTION_MEMORY_SIZE]
    }

    /// Instruction memory bookkeeping
    #[must_use]
    pub const fn memory(&self) -> InstructionMemory {
        self.memory
    }

    /// Number of programs currently loaded
    #[must_use]
    pub fn loaded_programs(&self) -> usize {
        self.loaded.len()
    }
}

impl Coprocessor for SimCoprocessor {
    fn instance(&self) -> PioInstance {
        self.instance
    }

    fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn lanes(&self) -> &LaneAllocator {
        &self.claims
    }

    fn add_program(&mut self, program: &ProgramAsset) -> Result<u8> {
        if self.loaded.is_full() {
            return Err(Error::ProgramSpace);
        }
        let offset = self.memory.allocate(program)?;
        for (slot, word) in self.instr[usize::from(offset)..].iter_mut().zip(program.relocated(offset)) {
            *slot = word;
        }
        let _ = self.loaded.push((offset, *program));
        Ok(offset)
    }

    fn remove_program(&mut self, program: &ProgramAsset, offset: u8) {
        self.memory.release(program, offset);
        self.loaded
            .retain(|(loaded_at, loaded)| !(*loaded_at == offset && loaded == program));
    }

    fn set_pin_dir(&mut self, _lane: LaneId, pin: PinId, output: bool) {
        self.reconfigure_pin(pin, |state| state.output_enable = output);
    }

    fn set_pin_level(&mut self, _lane: LaneId, pin: PinId, high: bool) {
        self.reconfigure_pin(pin, |state| state.output_high = high);
    }

    fn gpio_init(&mut self, pin: PinId) {
        let function = PinFunction::Pio(self.instance);
        self.reconfigure_pin(pin, |state| state.function = function);
    }

    fn gpio_deinit(&mut self, pin: PinId) {
        self.pins[pin.index()].function = PinFunction::Null;
    }

    fn set_pull_up(&mut self, pin: PinId, enabled: bool) {
        self.pins[pin.index()].pull_up = enabled;
    }

    fn init_lane(&mut self, lane: LaneId, config: &LaneConfig) {
        let program = self
            .loaded
            .iter()
            .find(|(offset, _)| *offset == config.origin)
            .map_or(LaneProgram::Unknown, |(_, program)| {
                if *program == UART_RX {
                    LaneProgram::Receiver
                } else if *program == UART_TX {
                    LaneProgram::Transmitter
                } else {
                    LaneProgram::Unknown
                }
            });
        self.machines[lane.index()].init(*config, program);
    }

    fn set_enabled(&mut self, lane: LaneId, enabled: bool) {
        self.machines[lane.index()].set_enabled(enabled);
    }

    fn clear_fifos(&mut self, lane: LaneId) {
        self.machines[lane.index()].clear_fifos();
    }

    fn rx_level(&self, lane: LaneId) -> usize {
        self.machines[lane.index()].rx_level()
    }

    fn rx_pop(&mut self, lane: LaneId) -> Option<u32> {
        self.machines[lane.index()].rx_pop()
    }

    fn tx_is_full(&self, lane: LaneId) -> bool {
        self.machines[lane.index()].tx_is_full()
    }

    /// Steps the simulation while the FIFO is full
    ///
    /// # Panics
    ///
    /// Panics if the wait could never end: the lane is disabled, has no TX
    /// FIFO, or is still full after [`STALL_LIMIT`] cycles.
    fn tx_push_blocking(&mut self, lane: LaneId, word: u32) {
        let index = lane.index();
        let mut waited = 0;
        while self.machines[index].tx_is_full() {
            let machine = &self.machines[index];
            assert!(
                machine.is_enabled() && machine.tx_depth() > 0,
                "push to {lane} would block forever"
            );
            assert!(waited < STALL_LIMIT, "{lane} TX FIFO stalled for {waited} cycles");
            self.step();
            waited += 1;
        }
        self.machines[index].tx_push(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coprocessor::FifoJoin;

    fn rx_config(sim: &mut SimCoprocessor, pin: PinId) -> LaneConfig {
        let offset = sim.add_program(&UART_RX).unwrap();
        let mut config = LaneConfig::for_program(&UART_RX, offset);
        config.set_in_pins(pin).set_jmp_pin(pin).set_fifo_join(FifoJoin::RxOnly);
        config
    }

    #[test]
    fn loading_writes_relocated_words() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio0);
        let offset = sim.add_program(&UART_TX).unwrap();
        assert_eq!(offset, 28);
        assert_eq!(sim.instruction(28), 0x9fa0);
        assert_eq!(sim.instruction(31), 0x065e);
        assert_eq!(sim.loaded_programs(), 1);

        sim.remove_program(&UART_TX, offset);
        assert_eq!(sim.loaded_programs(), 0);
        assert_eq!(sim.memory().used(), 0);
    }

    #[test]
    fn undriven_pin_follows_pull() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio0);
        assert!(!sim.level(PinId::GP5));
        sim.set_pull_up(PinId::GP5, true);
        assert!(sim.level(PinId::GP5));
    }

    #[test]
    fn output_needs_block_function() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio1);
        sim.set_pin_level(LaneId::SM0, PinId::GP4, true);
        sim.set_pin_dir(LaneId::SM0, PinId::GP4, true);
        assert!(!sim.level(PinId::GP4));
        sim.gpio_init(PinId::GP4);
        assert!(sim.level(PinId::GP4));
        sim.gpio_deinit(PinId::GP4);
        assert!(!sim.level(PinId::GP4));
    }

    #[test]
    fn muxing_before_level_counts_forced_low() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio1);
        sim.gpio_init(PinId::GP4);
        sim.set_pin_dir(LaneId::SM0, PinId::GP4, true);
        sim.set_pin_level(LaneId::SM0, PinId::GP4, true);
        assert_eq!(sim.forced_lows(PinId::GP4), 1);
        assert!(sim.level(PinId::GP4));

        let mut sim = SimCoprocessor::new(PioInstance::Pio1);
        sim.set_pin_level(LaneId::SM0, PinId::GP4, true);
        sim.set_pin_dir(LaneId::SM0, PinId::GP4, true);
        sim.gpio_init(PinId::GP4);
        assert_eq!(sim.forced_lows(PinId::GP4), 0);
    }

    #[test]
    fn receiver_lane_decodes_line() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio0);
        let config = rx_config(&mut sim, PinId::GP5);
        sim.set_pull_up(PinId::GP5, true);
        sim.init_lane(LaneId::SM2, &config);
        sim.set_enabled(LaneId::SM2, true);

        assert_eq!(sim.send(PinId::GP5, b"ok"), 2);
        sim.run_frames(3);
        assert_eq!(sim.rx_level(LaneId::SM2), 2);
        assert_eq!(sim.rx_pop(LaneId::SM2), Some(u32::from(b'o') << 24));
        assert_eq!(sim.rx_pop(LaneId::SM2), Some(u32::from(b'k') << 24));
    }

    #[test]
    fn disabled_lane_ignores_line() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio0);
        let config = rx_config(&mut sim, PinId::GP5);
        sim.init_lane(LaneId::SM0, &config);

        sim.send(PinId::GP5, b"x");
        sim.run_frames(2);
        assert_eq!(sim.rx_level(LaneId::SM0), 0);
    }

    #[test]
    #[should_panic(expected = "would block forever")]
    fn push_to_disabled_full_lane_panics() {
        let mut sim = SimCoprocessor::new(PioInstance::Pio0);
        let config = rx_config(&mut sim, PinId::GP5);
        // RX-joined: no TX FIFO at all
        sim.init_lane(LaneId::SM0, &config);
        sim.tx_push_blocking(LaneId::SM0, 0);
    }
}
