//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use pio_serial::config::*;
use pio_serial::types::{DataBits, FrameConfig, LaneId, Parity, PinId, PioInstance, StopBits};

// =============================================================================
// Clock and Timing Tests
// =============================================================================

#[test]
fn system_clock_valid() {
    // RP2040 default clk_sys
    assert_eq!(SYSTEM_CLOCK_HZ, 125_000_000);
}

#[test]
fn default_baud_standard() {
    assert_eq!(DEFAULT_BAUD, 115_200);
}

#[test]
fn oversampling_matches_programs() {
    // Both lane programs spend 8 cycles per bit
    assert_eq!(OVERSAMPLE_FACTOR, 8);
}

#[test]
fn frame_is_8n1() {
    assert_eq!(DATA_BITS, 8);
    assert_eq!(FRAME_BITS, 10);
}

// =============================================================================
// PIO Block Tests
// =============================================================================

#[test]
fn fifo_depths() {
    assert_eq!(FIFO_DEPTH, 4);
    assert_eq!(JOINED_FIFO_DEPTH, 8);
}

#[test]
fn block_geometry() {
    assert_eq!(LANES_PER_INSTANCE, 4);
    assert_eq!(NUM_INSTANCES, 2);
    assert_eq!(INSTRUCTION_MEMORY_SIZE, 32);
    assert_eq!(NUM_GPIOS, 30);
}

#[test]
fn default_lanes_distinct() {
    assert_ne!(DEFAULT_RX_LANE, DEFAULT_TX_LANE);
    assert_eq!(DEFAULT_RX_LANE, LaneId::SM0);
    assert_eq!(DEFAULT_TX_LANE, LaneId::SM1);
}

#[test]
fn function_selects() {
    assert_eq!(PioInstance::Pio0.funcsel(), FUNCSEL_PIO0);
    assert_eq!(PioInstance::Pio1.funcsel(), FUNCSEL_PIO1);
    assert_eq!(DEFAULT_INSTANCE, PioInstance::Pio1);
}

// =============================================================================
// Pin Tests
// =============================================================================

#[test]
fn serial_pins_distinct() {
    assert_ne!(pins::SERIAL_TX, pins::SERIAL_RX);
    assert_eq!(default_tx_pin(), PinId::GP4);
    assert_eq!(default_rx_pin(), PinId::GP5);
}

#[test]
fn pin_range_checked() {
    assert!(PinId::new(29).is_some());
    assert!(PinId::new(30).is_none());
    assert_eq!(PinId::new(5), Some(PinId::GP5));
}

#[test]
fn pin_display() {
    assert_eq!(format!("{}", PinId::GP4), "GP4");
    assert_eq!(format!("{:?}", LaneId::SM2), "SM2");
}

#[test]
fn lane_range_checked() {
    assert_eq!(LaneId::new(3), Some(LaneId::SM3));
    assert!(LaneId::new(4).is_none());
    assert_eq!(LaneId::ALL.len(), LANES_PER_INSTANCE);
}

// =============================================================================
// Frame Format Tests
// =============================================================================

#[test]
fn default_frame_is_native() {
    let frame = FrameConfig::default();
    assert_eq!(frame, FrameConfig::EIGHT_N_ONE);
    assert!(frame.is_native());
}

#[test]
fn other_frames_not_native() {
    let frame = FrameConfig {
        data_bits: DataBits::Seven,
        parity: Parity::Even,
        stop_bits: StopBits::One,
    };
    assert!(!frame.is_native());

    let frame = FrameConfig {
        stop_bits: StopBits::Two,
        ..FrameConfig::EIGHT_N_ONE
    };
    assert!(!frame.is_native());
}

// =============================================================================
// Timing Tests
// =============================================================================

#[test]
fn echo_poll_faster_than_a_frame() {
    // One 115200 baud frame lasts ~87 us
    assert!(ECHO_POLL_US < 87);
}

#[test]
fn heartbeat_reasonable() {
    assert!(HEARTBEAT_PERIOD_MS >= 100);
}
