//! Clock Divisor Tests
//!
//! Tests for the lane clock divider derived from system clock and baud rate.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test clock_tests

use pio_serial::clock::ClockDivider;
use pio_serial::config::{MAX_CLOCK_DIVIDER, OVERSAMPLE_FACTOR, SYSTEM_CLOCK_HZ};

fn approx(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

// =============================================================================
// Divisor Calculation Tests
// =============================================================================

#[test]
fn divisor_for_115200() {
    let div = ClockDivider::from_baud(125_000_000, 115_200);
    assert!(approx(div.as_f32(), 135.634, 0.01));
}

#[test]
fn divisor_for_9600() {
    let div = ClockDivider::from_baud(125_000_000, 9_600);
    assert!(approx(div.as_f32(), 1627.604, 0.01));
    assert!(div.is_in_range());
}

#[test]
fn divisor_scales_with_clock() {
    let slow = ClockDivider::from_baud(SYSTEM_CLOCK_HZ / 2, 115_200);
    let fast = ClockDivider::from_baud(SYSTEM_CLOCK_HZ, 115_200);
    assert!(approx(fast.as_f32(), slow.as_f32() * 2.0, 0.01));
}

#[test]
fn divisor_is_clock_over_eight_baud() {
    // One bit is OVERSAMPLE_FACTOR lane cycles
    let div = ClockDivider::from_baud(8_000_000, 1_000);
    assert!(approx(div.as_f32(), 8_000_000.0 / (OVERSAMPLE_FACTOR as f32 * 1_000.0), 0.001));
    assert!(approx(div.as_f32(), 1000.0, 0.001));
}

#[test]
fn exact_divisor_has_no_fraction() {
    let div = ClockDivider::from_baud(8_000_000, 1_000);
    assert_eq!(div.register_fields(), (1000, 0));
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn very_high_baud_is_below_range() {
    // 125 MHz / (8 * 20 Mbaud) < 1
    let div = ClockDivider::from_baud(125_000_000, 20_000_000);
    assert!(!div.is_in_range());
    assert_eq!(div.register_fields(), (1, 0));
}

#[test]
fn very_low_baud_is_above_range() {
    let div = ClockDivider::from_baud(125_000_000, 100);
    assert!(div.as_f32() > MAX_CLOCK_DIVIDER);
    assert!(!div.is_in_range());
    assert_eq!(div.effective(), MAX_CLOCK_DIVIDER);
}

#[test]
fn large_baud_does_not_overflow() {
    // 8 * u32::MAX overflows integer math
    let div = ClockDivider::from_baud(125_000_000, u32::MAX);
    assert!(div.as_f32() > 0.0);
    assert!(div.as_f32() < 1.0);
}

// =============================================================================
// Quantization Tests
// =============================================================================

#[test]
fn actual_baud_close_to_requested() {
    for baud in [9_600, 19_200, 57_600, 115_200, 230_400, 460_800, 921_600] {
        let div = ClockDivider::from_baud(SYSTEM_CLOCK_HZ, baud);
        let actual = div.actual_baud(SYSTEM_CLOCK_HZ);
        let error = (actual - baud as f32).abs() / baud as f32;
        assert!(error < 0.01, "{baud} baud off by {error}");
    }
}

#[test]
fn effective_is_quantized() {
    let div = ClockDivider::from_baud(125_000_000, 115_200);
    let effective = div.effective();
    assert!(approx(effective, 135.0 + 162.0 / 256.0, 1e-4));
    assert!(approx(effective, div.as_f32(), 1.0 / 256.0));
}

#[test]
fn default_is_unity() {
    assert_eq!(ClockDivider::default(), ClockDivider::UNITY);
    assert_eq!(ClockDivider::UNITY.register_fields(), (1, 0));
}
