//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep table positions and stack sizes from being
//! mixed up with the raw integers they are computed from.

use std::fmt;

/// Smallest stack segment the Go runtime hands out to a goroutine.
pub const MIN_STACK_SIZE: i64 = 2048;

/// Position of a function inside the pclntab `functab`
///
/// Stable for the lifetime of a loaded image. This is NOT an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncIndex(pub u32);

impl fmt::Display for FuncIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func#{}", self.0)
    }
}

/// Bytes reserved for one goroutine stack
///
/// Stacks grow by doubling, so the reserved size is the used size rounded up
/// to a power of two, never below [`MIN_STACK_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StackCapacity(pub i64);

impl StackCapacity {
    /// Capacity of a stack segment holding `used` bytes of frames
    #[must_use]
    pub fn for_used(used: i64) -> Self {
        Self(round_up_to_next_pow2(used).max(MIN_STACK_SIZE))
    }

    /// Reserved but unused bytes when `used` bytes are occupied
    #[must_use]
    pub fn free(self, used: i64) -> i64 {
        self.0 - used
    }
}

/// Smallest power of two that is `>= num`
///
/// Zero and negative inputs map to 1. Saturates at `i64::MAX` instead of
/// overflowing.
#[must_use]
pub fn round_up_to_next_pow2(num: i64) -> i64 {
    u64::try_from(num)
        .unwrap_or(0)
        .checked_next_power_of_two()
        .and_then(|p| i64::try_from(p).ok())
        .unwrap_or(i64::MAX)
}
