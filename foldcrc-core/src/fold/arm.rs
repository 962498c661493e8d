//! aarch64 folding kernel (NEON + PMULL).
//!
//! Same lane layout as the x86_64 narrow tier. The reduction runs on the
//! `u128` product returned by `vmull_p64`.

use core::arch::aarch64::*;

use super::NARROW_BLOCK;
use crate::constants::{CONSTANTS, KeyPair, LOW32_MASK};
use crate::probe::NARROW_LANE;

/// Load one narrow lane.
#[inline]
#[target_feature(enable = "neon")]
fn load_128(lane: &[u8; NARROW_LANE]) -> uint64x2_t {
    // SAFETY: `lane` is 16 readable bytes; `vld1q_u8` needs byte alignment only.
    vreinterpretq_u64_u8(unsafe { vld1q_u8(lane.as_ptr()) })
}

#[inline]
#[target_feature(enable = "neon")]
fn load_block_128(block: &[u8; NARROW_BLOCK]) -> [uint64x2_t; 4] {
    let (lanes, _) = block.as_chunks::<NARROW_LANE>();
    [
        load_128(&lanes[0]),
        load_128(&lanes[1]),
        load_128(&lanes[2]),
        load_128(&lanes[3]),
    ]
}

#[inline]
#[target_feature(enable = "neon")]
fn seed_128(crc: u32) -> uint64x2_t {
    vsetq_lane_u64(u64::from(crc), vdupq_n_u64(0), 0)
}

#[inline]
#[target_feature(enable = "neon", enable = "aes")]
fn fold_128(acc: uint64x2_t, next: uint64x2_t, keys: KeyPair) -> uint64x2_t {
    let lo = vreinterpretq_u64_p128(vmull_p64(vgetq_lane_u64(acc, 0), keys.lo));
    let hi = vreinterpretq_u64_p128(vmull_p64(vgetq_lane_u64(acc, 1), keys.hi));
    veorq_u64(veorq_u64(lo, hi), next)
}

#[inline]
#[target_feature(enable = "neon", enable = "aes")]
fn start_narrow(crc: u32, data: &[u8]) -> Option<(uint64x2_t, usize)> {
    if data.len() < 2 * NARROW_BLOCK {
        let (lane, _) = data.split_first_chunk::<NARROW_LANE>()?;
        return Some((veorq_u64(load_128(lane), seed_128(crc)), NARROW_LANE));
    }

    let (blocks, _) = data.as_chunks::<NARROW_BLOCK>();
    let (first, rest) = blocks.split_first()?;

    let [mut x1, mut x2, mut x3, mut x4] = load_block_128(first);
    x1 = veorq_u64(x1, seed_128(crc));

    for block in rest {
        let [y1, y2, y3, y4] = load_block_128(block);
        x1 = fold_128(x1, y1, CONSTANTS.fold_64);
        x2 = fold_128(x2, y2, CONSTANTS.fold_64);
        x3 = fold_128(x3, y3, CONSTANTS.fold_64);
        x4 = fold_128(x4, y4, CONSTANTS.fold_64);
    }

    let mut x = fold_128(x1, x2, CONSTANTS.fold_16);
    x = fold_128(x, x3, CONSTANTS.fold_16);
    x = fold_128(x, x4, CONSTANTS.fold_16);

    Some((x, blocks.len() * NARROW_BLOCK))
}

#[inline]
#[target_feature(enable = "neon", enable = "aes")]
fn reduce(x: uint64x2_t) -> u32 {
    let lo = vgetq_lane_u64(x, 0);
    let hi = vgetq_lane_u64(x, 1);

    let x = u128::from(hi) ^ vmull_p64(lo, CONSTANTS.reduce.hi);
    let x = vmull_p64(x as u64 & LOW32_MASK, CONSTANTS.reduce.lo) ^ (x >> 32);

    let t1 = vmull_p64(x as u64 & LOW32_MASK, CONSTANTS.barrett.hi);
    let t2 = vmull_p64(t1 as u64 & LOW32_MASK, CONSTANTS.barrett.lo);
    ((x ^ t2) >> 32) as u32
}

/// Narrow (128-bit) tier; see the x86_64 kernel for the contract.
#[target_feature(enable = "neon", enable = "aes")]
pub(super) fn fold_narrow(crc: u32, data: &[u8]) -> (u32, usize) {
    let Some((mut x, head)) = start_narrow(crc, data) else {
        return (crc, 0);
    };
    let (lanes, _) = data[head..].as_chunks::<NARROW_LANE>();
    for lane in lanes {
        x = fold_128(x, load_128(lane), CONSTANTS.fold_16);
    }
    (reduce(x), head + lanes.len() * NARROW_LANE)
}
