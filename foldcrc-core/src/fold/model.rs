//! Portable model of both folding tiers, built on a software carry-less
//! multiply. It runs on every target, so the fold constants (including the
//! wide ones) are checked even where no vector backend exists.

use super::{NARROW_BLOCK, WIDE_BLOCK};
use crate::constants::{CONSTANTS, FoldConstants, KeyPair, LOW32_MASK};
use crate::probe::{NARROW_LANE, WIDE_LANE};
use crate::scalar;

/// 64x64 -> 128 bit carry-less multiply.
pub(super) const fn clmul64(a: u64, b: u64) -> u128 {
    let mut product = 0u128;
    let mut i = 0;
    while i < 64 {
        if (b >> i) & 1 != 0 {
            product ^= (a as u128) << i;
        }
        i += 1;
    }
    product
}

type Wide = [u128; 4];

fn load(lane: &[u8; NARROW_LANE]) -> u128 {
    u128::from_le_bytes(*lane)
}

fn load_wide(lane: &[u8; WIDE_LANE]) -> Wide {
    let (lanes, _) = lane.as_chunks::<NARROW_LANE>();
    std::array::from_fn(|i| load(&lanes[i]))
}

fn fold(acc: u128, next: u128, keys: KeyPair) -> u128 {
    clmul64(acc as u64, keys.lo) ^ clmul64((acc >> 64) as u64, keys.hi) ^ next
}

fn fold_wide(acc: Wide, next: Wide, keys: KeyPair) -> Wide {
    std::array::from_fn(|i| fold(acc[i], next[i], keys))
}

fn fold_lanes(mut x: u128, data: &[u8], c: &FoldConstants) -> (u128, usize) {
    let (lanes, _) = data.as_chunks::<NARROW_LANE>();
    for lane in lanes {
        x = fold(x, load(lane), c.fold_16);
    }
    (x, lanes.len() * NARROW_LANE)
}

fn reduce(x: u128, c: &FoldConstants) -> u32 {
    let x = (x >> 64) ^ clmul64(x as u64, c.reduce.hi);
    let x = clmul64(x as u64 & LOW32_MASK, c.reduce.lo) ^ (x >> 32);
    let t1 = clmul64(x as u64 & LOW32_MASK, c.barrett.hi);
    let t2 = clmul64(t1 as u64 & LOW32_MASK, c.barrett.lo);
    ((x ^ t2) >> 32) as u32
}

/// Narrow tier with the constants `c`. Same contract as the engine.
pub(super) fn narrow(crc: u32, data: &[u8], c: &FoldConstants) -> (u32, usize) {
    let (x, head) = if data.len() >= 2 * NARROW_BLOCK {
        let (blocks, _) = data.as_chunks::<NARROW_BLOCK>();
        let mut acc: Vec<Wide> = blocks.iter().map(load_wide).collect();
        let mut x = acc.remove(0);
        x[0] ^= u128::from(crc);
        for next in acc {
            x = fold_wide(x, next, c.fold_64);
        }
        let mut a = x[0];
        for next in &x[1..] {
            a = fold(a, *next, c.fold_16);
        }
        (a, blocks.len() * NARROW_BLOCK)
    } else if let Some((lane, _)) = data.split_first_chunk::<NARROW_LANE>() {
        (load(lane) ^ u128::from(crc), NARROW_LANE)
    } else {
        return (crc, 0);
    };
    let (x, tail) = fold_lanes(x, &data[head..], c);
    (reduce(x, c), head + tail)
}

/// Wide tier with the constants `c`. Same contract as the engine.
pub(super) fn wide(crc: u32, data: &[u8], c: &FoldConstants) -> (u32, usize) {
    let (blocks, _) = data.as_chunks::<WIDE_BLOCK>();
    let Some((first, rest)) = blocks.split_first() else {
        return narrow(crc, data, c);
    };

    let load_block = |block: &[u8; WIDE_BLOCK]| -> [Wide; 4] {
        let (lanes, _) = block.as_chunks::<WIDE_LANE>();
        std::array::from_fn(|i| load_wide(&lanes[i]))
    };

    let mut acc = load_block(first);
    acc[0][0] ^= u128::from(crc);
    for block in rest {
        let next = load_block(block);
        for (a, n) in acc.iter_mut().zip(next) {
            *a = fold_wide(*a, n, c.fold_256);
        }
    }

    let mut x = acc[0];
    for next in &acc[1..] {
        x = fold_wide(x, *next, c.fold_64);
    }

    let mut consumed = blocks.len() * WIDE_BLOCK;
    let (lanes, _) = data[consumed..].as_chunks::<WIDE_LANE>();
    for lane in lanes {
        x = fold_wide(x, load_wide(lane), c.fold_64);
    }
    consumed += lanes.len() * WIDE_LANE;

    let mut a = x[0];
    for next in &x[1..] {
        a = fold(a, *next, c.fold_16);
    }
    let (a, tail) = fold_lanes(a, &data[consumed..], c);
    (reduce(a, c), consumed + tail)
}

/// Fold with `engine`, then finish the tail with the scalar table.
pub(super) fn checksum(
    engine: fn(u32, &[u8], &FoldConstants) -> (u32, usize),
    data: &[u8],
    c: &FoldConstants,
) -> u32 {
    let (crc, consumed) = engine(!0, data, c);
    !scalar::update(crc, &data[consumed..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const LENGTHS: &[usize] = &[
        0, 1, 15, 16, 17, 31, 32, 33, 63, 64, 65, 127, 128, 129, 255, 256, 257, 511, 512, 513,
        1023, 1024, 4096, 4097,
    ];

    fn test_data(len: usize) -> Vec<u8> {
        let mut seed: u64 = 0x123456789ABCDEF0;
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 56) as u8
            })
            .collect()
    }

    fn reference(data: &[u8]) -> u32 {
        !scalar::update(!0, data)
    }

    #[test]
    fn test_clmul64() {
        assert_eq!(clmul64(0, 0xFFFF), 0);
        assert_eq!(clmul64(1, 0xABCD), 0xABCD);
        // (x + 1)^2 = x^2 + 1 over GF(2)
        assert_eq!(clmul64(0b11, 0b11), 0b101);
        assert_eq!(clmul64(1 << 63, 1 << 63), 1 << 126);
    }

    #[test]
    fn test_narrow_model_matches_scalar() {
        let data = test_data(4097);
        for &len in LENGTHS {
            let slice = &data[..len];
            assert_eq!(
                checksum(narrow, slice, &CONSTANTS),
                reference(slice),
                "narrow model mismatch at length {}",
                len
            );
        }
    }

    #[test]
    fn test_wide_model_matches_scalar() {
        let data = test_data(4097);
        for &len in LENGTHS {
            let slice = &data[..len];
            assert_eq!(
                checksum(wide, slice, &CONSTANTS),
                reference(slice),
                "wide model mismatch at length {}",
                len
            );
        }
    }

    #[test]
    fn test_leaves_less_than_one_lane() {
        let data = test_data(4097);
        for &len in LENGTHS {
            let (_, n) = narrow(!0, &data[..len], &CONSTANTS);
            let (_, w) = wide(!0, &data[..len], &CONSTANTS);
            assert!(len - n < NARROW_LANE);
            assert!(len - w < NARROW_LANE);
        }
    }

    #[test]
    fn test_known_answer() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(checksum(narrow, data, &CONSTANTS), 0x414FA339);
    }

    fn swapped(pair: KeyPair) -> KeyPair {
        KeyPair {
            lo: pair.hi,
            hi: pair.lo,
        }
    }

    #[test]
    fn test_swapped_fold_halves_are_detected() {
        let data = test_data(100);
        let bad = FoldConstants {
            fold_16: swapped(CONSTANTS.fold_16),
            ..CONSTANTS
        };
        assert_ne!(checksum(narrow, &data, &bad), reference(&data));
    }

    #[test]
    fn test_swapped_reduction_halves_are_detected() {
        let data = test_data(48);
        let bad = FoldConstants {
            reduce: swapped(CONSTANTS.reduce),
            ..CONSTANTS
        };
        assert_ne!(checksum(narrow, &data, &bad), reference(&data));
    }

    #[test]
    fn test_wrong_wide_stride_is_detected() {
        let data = test_data(1024);
        let bad = FoldConstants {
            fold_256: CONSTANTS.fold_64,
            ..CONSTANTS
        };
        assert_ne!(checksum(wide, &data, &bad), reference(&data));
    }
}
