//! Carry-less multiply folding engine.
//!
//! The engine consumes the longest lane-aligned prefix of the input and
//! returns the CRC register for that prefix together with the number of
//! bytes consumed. Fewer than [`NARROW_LANE`] bytes are ever left over; the
//! orchestrator finishes them with the scalar engine.
//!
//! ## Algorithm Overview
//!
//! Based on Intel's "Fast CRC Computation for Generic Polynomials Using
//! PCLMULQDQ Instruction", bit-reflected variant:
//!
//! 1. Fold 64-byte (narrow) or 256-byte (wide) blocks into four accumulators
//! 2. Collapse the accumulators, then fold single lanes
//! 3. Reduce 128 bits to 64 bits, then Barrett-reduce to the 32-bit register
//!
//! Every vector load takes a `&[u8; N]` produced by bounds-checked chunking,
//! so the only unchecked part is the instruction itself.

#[cfg(target_arch = "aarch64")]
mod arm;
#[cfg(test)]
mod model;
#[cfg(target_arch = "x86_64")]
mod x86;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use crate::probe::NARROW_LANE;
use crate::probe::Tier;

/// Bytes in one block of four narrow lanes.
#[cfg(any(test, target_arch = "x86_64", target_arch = "aarch64"))]
const NARROW_BLOCK: usize = 64;

/// Bytes in one block of four wide lanes.
#[cfg(any(test, target_arch = "x86_64"))]
const WIDE_BLOCK: usize = 256;

/// Fold the lane-aligned prefix of `data` into `crc`.
///
/// Returns the updated register and the number of bytes consumed. The
/// unconsumed suffix is always shorter than one narrow lane.
///
/// # Safety
///
/// `tier` must come from [`crate::probe::select_tier`] evaluated for this
/// `data` with capabilities clamped to the running host, so that the vector
/// instructions of the tier are present and `data` holds at least one lane.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub(crate) unsafe fn fold(tier: Tier, crc: u32, data: &[u8]) -> (u32, usize) {
    debug_assert!(tier != Tier::None, "fold entered without a vector tier");
    debug_assert!(data.len() >= NARROW_LANE, "fold entered with a short buffer");

    #[cfg(target_arch = "x86_64")]
    {
        match tier {
            Tier::None => (crc, 0),
            // SAFETY: the caller guarantees PCLMULQDQ and SSE4.1 for this tier.
            Tier::Narrow128 => unsafe { x86::fold_narrow(crc, data) },
            // SAFETY: the caller guarantees AVX-512F and VPCLMULQDQ for this tier.
            Tier::Wide512 => unsafe { x86::fold_wide(crc, data) },
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        match tier {
            Tier::None => (crc, 0),
            // SAFETY: the caller guarantees NEON and PMULL. The wide tier is
            // never selected here because `clmul512` is never detected.
            Tier::Narrow128 | Tier::Wide512 => unsafe { arm::fold_narrow(crc, data) },
        }
    }
}

/// Fallback for targets without a folding backend: nothing is consumed.
///
/// # Safety
///
/// Always safe; kept `unsafe` to match the vector targets.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) unsafe fn fold(tier: Tier, crc: u32, _data: &[u8]) -> (u32, usize) {
    debug_assert!(tier == Tier::None, "no folding backend on this target");
    (crc, 0)
}
