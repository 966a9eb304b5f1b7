//! Serial Port Tests
//!
//! Tests for the SoftwareSerial facade: lifecycle, errors and the
//! non-blocking read path, driven by an external line on the RX pin.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test serial_tests

use pio_serial::coprocessor::Coprocessor;
use pio_serial::program::UART_RX;
use pio_serial::serial::{LaneChoice, SoftwareSerial};
use pio_serial::sim::{encode_frame, PinFunction, SimCoprocessor};
use pio_serial::types::{FrameConfig, LaneId, Parity, PinId, PioInstance};
use pio_serial::{Direction, Error};

const TX: PinId = PinId::GP4;
const RX: PinId = PinId::GP5;

fn sim() -> SimCoprocessor {
    SimCoprocessor::new(PioInstance::Pio0)
}

fn started() -> SoftwareSerial<SimCoprocessor> {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    serial.start(115_200).unwrap();
    serial
}

/// Queue bytes on the RX line and let them arrive
fn receive(serial: &mut SoftwareSerial<SimCoprocessor>, bytes: &[u8]) {
    let cop = serial.coprocessor_mut();
    assert_eq!(cop.send(RX, bytes), bytes.len());
    cop.run_frames(bytes.len() as u64 + 1);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn construction_touches_nothing() {
    let serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    assert!(!serial.is_started());
    assert_eq!(serial.baud(), None);
    assert_eq!(serial.divider(), None);
    let cop = serial.coprocessor();
    assert_eq!(cop.lanes().free(), 4);
    assert_eq!(cop.memory().used(), 0);
    assert_eq!(cop.pin(TX).function, PinFunction::Null);
}

#[test]
fn start_enables_both_lanes() {
    let serial = started();
    assert!(serial.is_started());
    assert_eq!(serial.baud(), Some(115_200));
    assert!(serial.rx_channel().is_enabled());
    assert!(serial.tx_channel().is_enabled());

    let cop = serial.coprocessor();
    assert!(cop.is_enabled(LaneId::SM0));
    assert!(cop.is_enabled(LaneId::SM1));
    assert_eq!(cop.loaded_programs(), 2);
}

#[test]
fn start_default_uses_115200() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    serial.start_default().unwrap();
    assert_eq!(serial.baud(), Some(115_200));
}

#[test]
fn divider_is_shared() {
    let serial = started();
    let divider = serial.divider().unwrap();
    assert!((divider.as_f32() - 135.634).abs() < 0.01);

    let cop = serial.coprocessor();
    assert_eq!(cop.lane_config(LaneId::SM0).unwrap().clock_divider, divider);
    assert_eq!(cop.lane_config(LaneId::SM1).unwrap().clock_divider, divider);
}

#[test]
fn zero_baud_rejected() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    assert_eq!(serial.start(0), Err(Error::InvalidBaudRate));
    assert!(!serial.is_started());
    assert_eq!(serial.coprocessor().lanes().free(), 4);
}

#[test]
fn double_start_rejected() {
    let mut serial = started();
    assert_eq!(serial.start(9_600), Err(Error::AlreadyStarted));
    assert_eq!(serial.baud(), Some(115_200));
}

#[test]
fn stop_releases_everything() {
    let mut serial = started();
    serial.stop();

    assert!(!serial.is_started());
    let cop = serial.coprocessor();
    assert!(!cop.is_enabled(LaneId::SM0));
    assert!(!cop.is_enabled(LaneId::SM1));
    assert_eq!(cop.lanes().free(), 4);
    assert_eq!(cop.memory().used(), 0);
    assert_eq!(cop.pin(TX).function, PinFunction::Null);
    assert_eq!(cop.pin(RX).function, PinFunction::Null);
    assert_eq!(serial.read(), Err(Error::NotConfigured(Direction::Rx)));
}

#[test]
fn restart_after_stop() {
    let mut serial = started();
    serial.end();
    serial.start(57_600).unwrap();
    assert_eq!(serial.baud(), Some(57_600));

    receive(&mut serial, b"again");
    assert_eq!(serial.available(), Ok(5));
}

#[test]
fn stop_when_idle_is_noop() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    serial.stop();
    assert!(!serial.is_started());
}

#[test]
fn release_returns_coprocessor_stopped() {
    let serial = started();
    let cop = serial.release();
    assert_eq!(cop.lanes().free(), 4);
    assert_eq!(cop.memory().used(), 0);
}

#[test]
fn start_with_config_runs_8n1() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    let frame = FrameConfig {
        parity: Parity::Even,
        ..FrameConfig::EIGHT_N_ONE
    };
    serial.start_with_config(115_200, frame).unwrap();
    receive(&mut serial, b"x");
    assert_eq!(serial.read(), Ok(Some(b'x')));
}

// =============================================================================
// Resource Conflicts
// =============================================================================

#[test]
fn tx_lane_in_use_rolls_back_rx() {
    let cop = sim();
    cop.lanes().acquire(LaneId::SM1).unwrap();
    let mut serial = SoftwareSerial::new(cop, Some(TX), Some(RX));

    assert_eq!(serial.start(115_200), Err(Error::LaneInUse(LaneId::SM1)));
    assert!(!serial.is_started());
    assert!(!serial.rx_channel().is_enabled());

    let cop = serial.coprocessor();
    assert!(!cop.lanes().is_claimed(LaneId::SM0));
    assert!(cop.lanes().is_claimed(LaneId::SM1));
    assert_eq!(cop.memory().used(), 0);
    assert_eq!(cop.pin(RX).function, PinFunction::Null);
}

#[test]
fn rx_lane_in_use() {
    let cop = sim();
    cop.lanes().acquire(LaneId::SM0).unwrap();
    let mut serial = SoftwareSerial::new(cop, Some(TX), Some(RX));
    assert_eq!(serial.start(115_200), Err(Error::LaneInUse(LaneId::SM0)));
    assert_eq!(serial.coprocessor().lanes().free(), 3);
}

#[test]
fn auto_lanes_skip_claimed() {
    let cop = sim();
    cop.lanes().acquire(LaneId::SM0).unwrap();
    let mut serial = SoftwareSerial::with_lanes(cop, Some(TX), Some(RX), LaneChoice::Auto, LaneChoice::Auto);
    serial.start(115_200).unwrap();

    assert_eq!(serial.rx_channel().running_lane(), Ok(LaneId::SM1));
    assert_eq!(serial.tx_channel().running_lane(), Ok(LaneId::SM2));
}

#[test]
fn no_free_lane() {
    let cop = sim();
    for lane in LaneId::ALL {
        cop.lanes().acquire(lane).unwrap();
    }
    let mut serial = SoftwareSerial::with_lanes(cop, Some(TX), Some(RX), LaneChoice::Auto, LaneChoice::Auto);
    assert_eq!(serial.start(115_200), Err(Error::LanesExhausted));
}

#[test]
fn no_program_space() {
    let mut cop = sim();
    for _ in 0..3 {
        cop.add_program(&UART_RX).unwrap();
    }
    let mut serial = SoftwareSerial::new(cop, Some(TX), Some(RX));
    assert_eq!(serial.start(115_200), Err(Error::ProgramSpace));
    let cop = serial.coprocessor();
    assert_eq!(cop.lanes().free(), 4);
    assert_eq!(cop.pin(RX).function, PinFunction::Null);
}

// =============================================================================
// Unconfigured Directions
// =============================================================================

#[test]
fn operations_before_start() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), Some(RX));
    assert_eq!(serial.available(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.read(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.peek(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.write(b'a'), Err(Error::NotConfigured(Direction::Tx)));
}

#[test]
fn rx_only_port() {
    let mut serial = SoftwareSerial::new(sim(), None, Some(RX));
    serial.start(115_200).unwrap();

    assert!(serial.rx_channel().is_enabled());
    assert!(!serial.tx_channel().is_enabled());
    assert_eq!(serial.write(b'a'), Err(Error::NotConfigured(Direction::Tx)));
    assert_eq!(serial.write_ready(), Err(Error::NotConfigured(Direction::Tx)));
    assert_eq!(serial.coprocessor().lanes().free(), 3);

    receive(&mut serial, b"r");
    assert_eq!(serial.read(), Ok(Some(b'r')));
}

#[test]
fn tx_only_port() {
    let mut serial = SoftwareSerial::new(sim(), Some(TX), None);
    serial.start(115_200).unwrap();

    assert_eq!(serial.available(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.read(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.write(b'a'), Ok(1));
}

// =============================================================================
// Reading
// =============================================================================

#[test]
fn nothing_available_after_start() {
    let mut serial = started();
    assert_eq!(serial.available(), Ok(0));
    serial.coprocessor_mut().run_frames(5);
    assert_eq!(serial.available(), Ok(0));
}

#[test]
fn read_empty_never_blocks() {
    let mut serial = started();
    for _ in 0..10 {
        assert_eq!(serial.read(), Ok(None));
    }
    assert_eq!(serial.peek(), Ok(None));
}

#[test]
fn available_counts_up_to_fifo_depth() {
    let mut serial = started();
    for expected in 1..=8 {
        receive(&mut serial, &[expected as u8]);
        assert_eq!(serial.available(), Ok(expected));
    }
}

#[test]
fn bytes_read_in_order() {
    let mut serial = started();
    receive(&mut serial, b"hello");
    assert_eq!(serial.available(), Ok(5));
    for &expected in b"hello" {
        assert_eq!(serial.read(), Ok(Some(expected)));
    }
    assert_eq!(serial.read(), Ok(None));
}

#[test]
fn extreme_byte_values() {
    let mut serial = started();
    receive(&mut serial, &[0x00, 0xFF, 0x55, 0xAA]);
    assert_eq!(serial.read(), Ok(Some(0x00)));
    assert_eq!(serial.read(), Ok(Some(0xFF)));
    assert_eq!(serial.read(), Ok(Some(0x55)));
    assert_eq!(serial.read(), Ok(Some(0xAA)));
}

#[test]
fn peek_does_not_consume() {
    let mut serial = started();
    receive(&mut serial, b"AB");

    assert_eq!(serial.peek(), Ok(Some(b'A')));
    assert_eq!(serial.peek(), Ok(Some(b'A')));
    assert_eq!(serial.read(), Ok(Some(b'A')));
    assert_eq!(serial.peek(), Ok(Some(b'B')));
    assert_eq!(serial.read(), Ok(Some(b'B')));
    assert_eq!(serial.read(), Ok(None));
}

#[test]
fn stop_drops_peeked_byte() {
    let mut serial = started();
    receive(&mut serial, b"Q");
    assert_eq!(serial.peek(), Ok(Some(b'Q')));

    serial.stop();
    assert_eq!(serial.read(), Err(Error::NotConfigured(Direction::Rx)));
    assert_eq!(serial.peek(), Err(Error::NotConfigured(Direction::Rx)));

    serial.start(115_200).unwrap();
    assert_eq!(serial.read(), Ok(None));
    assert_eq!(serial.peek(), Ok(None));
}

#[test]
fn peeked_byte_not_counted_as_available() {
    let mut serial = started();
    receive(&mut serial, b"AB");
    serial.peek().unwrap();
    assert_eq!(serial.available(), Ok(1));
}

// =============================================================================
// Overrun
// =============================================================================

#[test]
fn overrun_keeps_oldest_bytes() {
    let mut serial = started();
    let sent: Vec<u8> = (b'0'..=b'9').collect();
    receive(&mut serial, &sent);

    // 8 in the FIFO, the 9th held by the stalled lane, the 10th lost
    assert_eq!(serial.available(), Ok(8));
    for &expected in &sent[..8] {
        assert_eq!(serial.read(), Ok(Some(expected)));
    }

    serial.coprocessor_mut().run(2);
    assert_eq!(serial.available(), Ok(1));
    assert_eq!(serial.read(), Ok(Some(sent[8])));

    serial.coprocessor_mut().run_frames(2);
    assert_eq!(serial.read(), Ok(None));
}

#[test]
fn receiving_resumes_after_overrun() {
    let mut serial = started();
    receive(&mut serial, &[0; 10]);
    while serial.read().unwrap().is_some() {
        serial.coprocessor_mut().run(2);
    }

    receive(&mut serial, b"ok");
    assert_eq!(serial.read(), Ok(Some(b'o')));
    assert_eq!(serial.read(), Ok(Some(b'k')));
}

// =============================================================================
// Framing Errors
// =============================================================================

#[test]
fn low_stop_bit_discards_byte() {
    let mut serial = started();
    let cop = serial.coprocessor_mut();
    assert!(cop.send_frame(RX, encode_frame(0x55) & !(1 << 9)));
    cop.run_frames(3);
    assert_eq!(cop.framing_errors(LaneId::SM0), 1);
    assert_eq!(serial.available(), Ok(0));

    receive(&mut serial, b"Z");
    assert_eq!(serial.read(), Ok(Some(b'Z')));
}

// =============================================================================
// Writing
// =============================================================================

#[test]
fn write_returns_one() {
    let mut serial = started();
    assert_eq!(serial.write(0x42), Ok(1));
    assert_eq!(serial.coprocessor().tx_level(LaneId::SM1), 1);
}

#[test]
fn write_ready_tracks_fifo() {
    let mut serial = started();
    assert_eq!(serial.write_ready(), Ok(true));
    for byte in 0..8 {
        serial.write(byte).unwrap();
    }
    // Lane has not run yet: all 8 slots taken
    assert_eq!(serial.write_ready(), Ok(false));
    serial.coprocessor_mut().run(1);
    assert_eq!(serial.write_ready(), Ok(true));
}

#[test]
fn write_waits_for_room() {
    let mut serial = started();
    for byte in 0..20 {
        assert_eq!(serial.write(byte), Ok(1));
    }
    assert!(serial.coprocessor().cycle() > 0);
}

#[test]
fn flush_and_ready() {
    let mut serial = started();
    serial.write(b'x').unwrap();
    assert_eq!(serial.flush(), Ok(()));
    assert!(serial.is_ready());
    // flush does not wait for the wire
    assert_eq!(serial.coprocessor().tx_level(LaneId::SM1), 1);
}
