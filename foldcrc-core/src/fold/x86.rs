//! x86_64 folding kernels.
//!
//! - Narrow: PCLMULQDQ on 128-bit lanes (SSE4.1 for the final extract)
//! - Wide: AVX-512 VPCLMULQDQ on 512-bit lanes, reduced through the narrow path
//!
//! The lane layout follows the zlib/Chromium `crc32_simd` kernels.

use core::arch::x86_64::*;

use super::{NARROW_BLOCK, WIDE_BLOCK};
use crate::constants::{CONSTANTS, KeyPair, LOW32_MASK};
use crate::probe::{NARROW_LANE, WIDE_LANE};

#[inline]
#[target_feature(enable = "sse4.1")]
fn keys_128(pair: KeyPair) -> __m128i {
    _mm_set_epi64x(pair.hi as i64, pair.lo as i64)
}

/// Load one narrow lane.
#[inline]
#[target_feature(enable = "sse4.1")]
fn load_128(lane: &[u8; NARROW_LANE]) -> __m128i {
    // SAFETY: `lane` is 16 readable bytes and the load is unaligned.
    unsafe { _mm_loadu_si128(lane.as_ptr().cast()) }
}

#[inline]
#[target_feature(enable = "sse4.1")]
fn load_block_128(block: &[u8; NARROW_BLOCK]) -> [__m128i; 4] {
    let (lanes, _) = block.as_chunks::<NARROW_LANE>();
    [
        load_128(&lanes[0]),
        load_128(&lanes[1]),
        load_128(&lanes[2]),
        load_128(&lanes[3]),
    ]
}

/// CRC register placed in the low 32 bits of a lane.
#[inline]
#[target_feature(enable = "sse4.1")]
fn seed_128(crc: u32) -> __m128i {
    _mm_cvtsi32_si128(crc as i32)
}

/// `acc.lo * keys.lo ^ acc.hi * keys.hi ^ next`
#[inline]
#[target_feature(enable = "pclmulqdq", enable = "sse4.1")]
fn fold_128(acc: __m128i, next: __m128i, keys: __m128i) -> __m128i {
    let lo = _mm_clmulepi64_si128(acc, keys, 0x00);
    let hi = _mm_clmulepi64_si128(acc, keys, 0x11);
    _mm_xor_si128(_mm_xor_si128(lo, hi), next)
}

/// Seed the narrow accumulator: four-way fold for long inputs, a single
/// lane otherwise.
#[inline]
#[target_feature(enable = "pclmulqdq", enable = "sse4.1")]
fn start_narrow(crc: u32, data: &[u8]) -> Option<(__m128i, usize)> {
    if data.len() < 2 * NARROW_BLOCK {
        let (lane, _) = data.split_first_chunk::<NARROW_LANE>()?;
        return Some((_mm_xor_si128(load_128(lane), seed_128(crc)), NARROW_LANE));
    }

    let (blocks, _) = data.as_chunks::<NARROW_BLOCK>();
    let (first, rest) = blocks.split_first()?;

    let [mut x1, mut x2, mut x3, mut x4] = load_block_128(first);
    x1 = _mm_xor_si128(x1, seed_128(crc));

    let k1k2 = keys_128(CONSTANTS.fold_64);
    for block in rest {
        let [y1, y2, y3, y4] = load_block_128(block);
        x1 = fold_128(x1, y1, k1k2);
        x2 = fold_128(x2, y2, k1k2);
        x3 = fold_128(x3, y3, k1k2);
        x4 = fold_128(x4, y4, k1k2);
    }

    let k3k4 = keys_128(CONSTANTS.fold_16);
    let mut x = fold_128(x1, x2, k3k4);
    x = fold_128(x, x3, k3k4);
    x = fold_128(x, x4, k3k4);

    Some((x, blocks.len() * NARROW_BLOCK))
}

/// Fold every whole 16-byte lane of `data` into `x`.
#[inline]
#[target_feature(enable = "pclmulqdq", enable = "sse4.1")]
fn fold_lanes(mut x: __m128i, data: &[u8]) -> (__m128i, usize) {
    let keys = keys_128(CONSTANTS.fold_16);
    let (lanes, _) = data.as_chunks::<NARROW_LANE>();
    for lane in lanes {
        x = fold_128(x, load_128(lane), keys);
    }
    (x, lanes.len() * NARROW_LANE)
}

/// Reduce a 128-bit accumulator to the 32-bit CRC register.
#[inline]
#[target_feature(enable = "pclmulqdq", enable = "sse4.1")]
fn reduce(x: __m128i) -> u32 {
    let mask = _mm_set_epi64x(LOW32_MASK as i64, LOW32_MASK as i64);

    // 128 -> 96 -> 64 bits
    let keys = keys_128(CONSTANTS.reduce);
    let x = _mm_xor_si128(_mm_srli_si128(x, 8), _mm_clmulepi64_si128(x, keys, 0x10));
    let x = _mm_xor_si128(
        _mm_clmulepi64_si128(_mm_and_si128(x, mask), keys, 0x00),
        _mm_srli_si128(x, 4),
    );

    // Barrett reduction to 32 bits
    let pu = keys_128(CONSTANTS.barrett);
    let t1 = _mm_clmulepi64_si128(_mm_and_si128(x, mask), pu, 0x10);
    let t2 = _mm_clmulepi64_si128(_mm_and_si128(t1, mask), pu, 0x00);

    // Reflected variant: the result sits in bits 32..63.
    _mm_extract_epi32(_mm_xor_si128(x, t2), 1) as u32
}

/// Narrow (128-bit) tier.
///
/// Returns the register for the consumed prefix and its length; fewer than
/// 16 bytes are left over.
#[target_feature(enable = "pclmulqdq", enable = "sse4.1")]
pub(super) fn fold_narrow(crc: u32, data: &[u8]) -> (u32, usize) {
    let Some((x, head)) = start_narrow(crc, data) else {
        return (crc, 0);
    };
    let (x, tail) = fold_lanes(x, &data[head..]);
    (reduce(x), head + tail)
}

#[inline]
#[target_feature(enable = "avx512f")]
fn keys_512(pair: KeyPair) -> __m512i {
    _mm512_broadcast_i32x4(_mm_set_epi64x(pair.hi as i64, pair.lo as i64))
}

/// Load one wide lane.
#[inline]
#[target_feature(enable = "avx512f")]
fn load_512(lane: &[u8; WIDE_LANE]) -> __m512i {
    // SAFETY: `lane` is 64 readable bytes and the load is unaligned.
    unsafe { _mm512_loadu_si512(lane.as_ptr().cast()) }
}

#[inline]
#[target_feature(enable = "avx512f")]
fn load_block_512(block: &[u8; WIDE_BLOCK]) -> [__m512i; 4] {
    let (lanes, _) = block.as_chunks::<WIDE_LANE>();
    [
        load_512(&lanes[0]),
        load_512(&lanes[1]),
        load_512(&lanes[2]),
        load_512(&lanes[3]),
    ]
}

/// Same as [`fold_128`] on each of the four 128-bit lanes.
#[inline]
#[target_feature(enable = "avx512f", enable = "vpclmulqdq")]
fn fold_512(acc: __m512i, next: __m512i, keys: __m512i) -> __m512i {
    let lo = _mm512_clmulepi64_epi128(acc, keys, 0x00);
    let hi = _mm512_clmulepi64_epi128(acc, keys, 0x11);
    _mm512_xor_si512(_mm512_xor_si512(lo, hi), next)
}

/// Fold whole 256-byte blocks and 64-byte lanes, then collapse the 512-bit
/// accumulator to 128 bits.
#[inline]
#[target_feature(enable = "avx512f", enable = "vpclmulqdq", enable = "pclmulqdq", enable = "sse4.1")]
fn start_wide(crc: u32, data: &[u8]) -> Option<(__m128i, usize)> {
    let (blocks, _) = data.as_chunks::<WIDE_BLOCK>();
    let (first, rest) = blocks.split_first()?;

    let [mut x1, mut x2, mut x3, mut x4] = load_block_512(first);
    x1 = _mm512_xor_si512(x1, _mm512_zextsi128_si512(seed_128(crc)));

    let k1k2 = keys_512(CONSTANTS.fold_256);
    for block in rest {
        let [y1, y2, y3, y4] = load_block_512(block);
        x1 = fold_512(x1, y1, k1k2);
        x2 = fold_512(x2, y2, k1k2);
        x3 = fold_512(x3, y3, k1k2);
        x4 = fold_512(x4, y4, k1k2);
    }

    let k3k4 = keys_512(CONSTANTS.fold_64);
    let mut x = fold_512(x1, x2, k3k4);
    x = fold_512(x, x3, k3k4);
    x = fold_512(x, x4, k3k4);

    let mut consumed = blocks.len() * WIDE_BLOCK;
    let (lanes, _) = data[consumed..].as_chunks::<WIDE_LANE>();
    for lane in lanes {
        x = fold_512(x, load_512(lane), k3k4);
    }
    consumed += lanes.len() * WIDE_LANE;

    // 512 -> 128 bits, lanes in address order
    let k5k6 = keys_128(CONSTANTS.fold_16);
    let mut a = _mm512_extracti32x4_epi32(x, 0);
    a = fold_128(a, _mm512_extracti32x4_epi32(x, 1), k5k6);
    a = fold_128(a, _mm512_extracti32x4_epi32(x, 2), k5k6);
    a = fold_128(a, _mm512_extracti32x4_epi32(x, 3), k5k6);

    Some((a, consumed))
}

/// Wide (512-bit) tier.
///
/// Inputs shorter than one 256-byte block go through the narrow tier.
#[target_feature(enable = "avx512f", enable = "vpclmulqdq", enable = "pclmulqdq", enable = "sse4.1")]
pub(super) fn fold_wide(crc: u32, data: &[u8]) -> (u32, usize) {
    let Some((x, head)) = start_wide(crc, data) else {
        return fold_narrow(crc, data);
    };
    let (x, tail) = fold_lanes(x, &data[head..]);
    (reduce(x), head + tail)
}
