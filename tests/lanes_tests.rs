//! Lane Allocation Tests
//!
//! Tests for state machine claims within one PIO block.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test lanes_tests

use pio_serial::lanes::{LaneAllocator, PIO0_LANES, PIO1_LANES};
use pio_serial::types::{LaneId, PioInstance};
use pio_serial::Error;

// =============================================================================
// Fixed Claims
// =============================================================================

#[test]
fn fresh_allocator_is_free() {
    let lanes = LaneAllocator::new();
    assert_eq!(lanes.free(), 4);
    for lane in LaneId::ALL {
        assert!(!lanes.is_claimed(lane));
    }
}

#[test]
fn claim_is_exclusive() {
    let lanes = LaneAllocator::new();
    assert!(lanes.acquire(LaneId::SM2).is_ok());
    assert_eq!(lanes.acquire(LaneId::SM2), Err(Error::LaneInUse(LaneId::SM2)));
    assert!(lanes.is_claimed(LaneId::SM2));
    assert_eq!(lanes.free(), 3);
}

#[test]
fn release_makes_lane_available() {
    let lanes = LaneAllocator::new();
    lanes.acquire(LaneId::SM0).unwrap();
    lanes.release(LaneId::SM0);
    assert!(!lanes.is_claimed(LaneId::SM0));
    assert!(lanes.acquire(LaneId::SM0).is_ok());
}

#[test]
fn release_of_free_lane_is_harmless() {
    let lanes = LaneAllocator::new();
    lanes.release(LaneId::SM3);
    assert_eq!(lanes.free(), 4);
}

// =============================================================================
// Automatic Claims
// =============================================================================

#[test]
fn acquire_any_takes_lowest() {
    let lanes = LaneAllocator::new();
    assert_eq!(lanes.acquire_any(), Ok(LaneId::SM0));
    assert_eq!(lanes.acquire_any(), Ok(LaneId::SM1));
    lanes.release(LaneId::SM0);
    assert_eq!(lanes.acquire_any(), Ok(LaneId::SM0));
}

#[test]
fn acquire_any_skips_fixed_claims() {
    let lanes = LaneAllocator::new();
    lanes.acquire(LaneId::SM0).unwrap();
    lanes.acquire(LaneId::SM1).unwrap();
    assert_eq!(lanes.acquire_any(), Ok(LaneId::SM2));
}

#[test]
fn exhaustion() {
    let lanes = LaneAllocator::new();
    for _ in 0..4 {
        lanes.acquire_any().unwrap();
    }
    assert_eq!(lanes.free(), 0);
    assert_eq!(lanes.acquire_any(), Err(Error::LanesExhausted));
}

// =============================================================================
// Block Allocators
// =============================================================================

#[test]
fn block_allocators_are_distinct() {
    assert!(core::ptr::eq(LaneAllocator::for_instance(PioInstance::Pio0), &PIO0_LANES));
    assert!(core::ptr::eq(LaneAllocator::for_instance(PioInstance::Pio1), &PIO1_LANES));
    assert!(!core::ptr::eq(&PIO0_LANES, &PIO1_LANES));
}

#[test]
fn claims_on_one_block_leave_the_other() {
    // Only this test touches the process-wide statics
    PIO0_LANES.acquire(LaneId::SM3).unwrap();
    assert!(PIO0_LANES.is_claimed(LaneId::SM3));
    assert!(!PIO1_LANES.is_claimed(LaneId::SM3));
    PIO0_LANES.release(LaneId::SM3);
}
