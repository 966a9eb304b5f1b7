//! Lane Allocation
//!
//! Tracks which state machines of a PIO block are claimed. One allocator
//! exists per block; on target they are process-wide statics so every
//! driver sharing a block sees the same claims.

use core::cell::Cell;

use critical_section::Mutex;

use crate::error::{Error, Result};
use crate::types::{LaneId, PioInstance};

/// Claim bitmap for the 4 lanes of one PIO block
pub struct LaneAllocator {
    claimed: Mutex<Cell<u8>>,
}

/// Lane claims of PIO0
pub static PIO0_LANES: LaneAllocator = LaneAllocator::new();

/// Lane claims of PIO1
pub static PIO1_LANES: LaneAllocator = LaneAllocator::new();

impl LaneAllocator {
    /// Allocator with every lane free
    #[must_use]
    pub const fn new() -> Self {
        Self {
            claimed: Mutex::new(Cell::new(0)),
        }
    }

    /// Process-wide allocator of a hardware block
    #[must_use]
    pub fn for_instance(instance: PioInstance) -> &'static Self {
        match instance {
            PioInstance::Pio0 => &PIO0_LANES,
            PioInstance::Pio1 => &PIO1_LANES,
        }
    }

    /// Claim a specific lane
    pub fn acquire(&self, lane: LaneId) -> Result<()> {
        critical_section::with(|cs| {
            let cell = self.claimed.borrow(cs);
            let claimed = cell.get();
            if claimed & lane.mask() != 0 {
                warn!("lane {} already claimed", lane);
                return Err(Error::LaneInUse(lane));
            }
            cell.set(claimed | lane.mask());
            Ok(())
        })
    }

    /// Claim the lowest free lane
    pub fn acquire_any(&self) -> Result<LaneId> {
        critical_section::with(|cs| {
            let cell = self.claimed.borrow(cs);
            let claimed = cell.get();
            let lane = LaneId::ALL
                .into_iter()
                .find(|lane| claimed & lane.mask() == 0)
                .ok_or(Error::LanesExhausted)?;
            cell.set(claimed | lane.mask());
            Ok(lane)
        })
    }

    /// Give a lane back; releasing a free lane does nothing
    pub fn release(&self, lane: LaneId) {
        critical_section::with(|cs| {
            let cell = self.claimed.borrow(cs);
            cell.set(cell.get() & !lane.mask());
        });
    }

    /// Whether `lane` is currently claimed
    #[must_use]
    pub fn is_claimed(&self, lane: LaneId) -> bool {
        critical_section::with(|cs| self.claimed.borrow(cs).get() & lane.mask() != 0)
    }

    /// Number of free lanes
    #[must_use]
    pub fn free(&self) -> u32 {
        let claimed = critical_section::with(|cs| self.claimed.borrow(cs).get());
        LaneId::ALL.len() as u32 - claimed.count_ones()
    }
}

impl Default for LaneAllocator {
    fn default() -> Self {
        Self::new()
    }
}
