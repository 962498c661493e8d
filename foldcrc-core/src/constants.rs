//! GF(2) fold and reduction constants for the reflected CRC-32 polynomial.
//!
//! Every multiplier used by the folding engine is derived here, at compile
//! time, from [`POLYNOMIAL`]. The scalar lookup table is built from the same
//! polynomial (see [`crate::scalar`]), so the two paths cannot drift apart.
//!
//! ## Derivation
//!
//! Folding a 128-bit lane forward by `d` bits multiplies its low 64-bit half
//! by `x^(d+32) mod P` and its high half by `x^(d-32) mod P`. In the
//! bit-reflected domain each remainder is stored as a 33-bit reversed value:
//!
//! ```text
//! K(n) = reflect33(x^n mod P(x))
//! fold pair for a stride of s bytes = (lo: K(8s + 32), hi: K(8s - 32))
//! ```
//!
//! The Barrett pair holds the full 33-bit polynomial `P'` and
//! `mu' = reflect33(floor(x^64 / P(x)))`.

/// CRC-32 (ISO-HDLC) generator polynomial, normal form without the `x^32` term.
pub const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Bit-reflected form of [`POLYNOMIAL`], used by the scalar table.
pub const REFLECTED_POLYNOMIAL: u32 = POLYNOMIAL.reverse_bits();

/// Revision of the constant table layout in [`FoldConstants`].
pub const CONSTANTS_VERSION: u32 = 1;

/// Keeps the low 32 bits of a 64-bit half.
///
/// Reduction steps mask before every multiply so that only the intended bits
/// take part in the carry-less product.
pub const LOW32_MASK: u64 = 0xFFFF_FFFF;

/// Two 64-bit carry-less multipliers applied to the halves of a 128-bit lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPair {
    /// Multiplier for the low 64-bit half.
    pub lo: u64,
    /// Multiplier for the high 64-bit half.
    pub hi: u64,
}

impl KeyPair {
    /// Fold pair that moves a 16-byte lane forward by `stride` bytes.
    pub const fn for_stride(stride: usize) -> Self {
        let bits = (stride * 8) as u32;
        Self {
            lo: fold_key(bits + 32),
            hi: fold_key(bits - 32),
        }
    }
}

/// The full set of multipliers, one pair per stage of the folding engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldConstants {
    /// Stride of four 64-byte lanes (wide multi-accumulator loop).
    pub fold_256: KeyPair,
    /// Stride of four 16-byte lanes, which is also one 64-byte lane.
    pub fold_64: KeyPair,
    /// Stride of a single 16-byte lane.
    pub fold_16: KeyPair,
    /// 128 to 64 bit reduction: `hi = K(96)` first, then `lo = K(64)`.
    pub reduce: KeyPair,
    /// Barrett reduction: `lo = P'`, `hi = mu'`.
    pub barrett: KeyPair,
}

impl FoldConstants {
    /// Derive every constant from [`POLYNOMIAL`].
    pub const fn derive() -> Self {
        Self {
            fold_256: KeyPair::for_stride(256),
            fold_64: KeyPair::for_stride(64),
            fold_16: KeyPair::for_stride(16),
            reduce: KeyPair {
                lo: fold_key(64),
                hi: fold_key(96),
            },
            barrett: KeyPair {
                lo: reflect33((1 << 32) | POLYNOMIAL as u64),
                hi: reflect33(barrett_quotient()),
            },
        }
    }
}

/// Constants for CRC-32, computed at compile time.
pub const CONSTANTS: FoldConstants = FoldConstants::derive();

/// `x^n mod P(x)` in normal (MSB-first) form.
const fn xpow_mod(n: u32) -> u32 {
    let mut rem: u32 = 1;
    let mut i = 0;
    while i < n {
        let carry = rem & 0x8000_0000 != 0;
        rem <<= 1;
        if carry {
            rem ^= POLYNOMIAL;
        }
        i += 1;
    }
    rem
}

/// Reverse the low 33 bits of `v`.
const fn reflect33(v: u64) -> u64 {
    (v & 0x1_FFFF_FFFF).reverse_bits() >> 31
}

/// `K(n)` as described in the module docs.
pub const fn fold_key(n: u32) -> u64 {
    reflect33(xpow_mod(n) as u64)
}

/// `floor(x^64 / P(x))` with `P` including its `x^32` term (33-bit result).
const fn barrett_quotient() -> u64 {
    let divisor: u128 = (1 << 32) | POLYNOMIAL as u128;
    let mut rem: u128 = 1 << 64;
    let mut quotient: u64 = 0;
    let mut bit: u32 = 64;
    while bit >= 32 {
        if (rem >> bit) & 1 != 0 {
            rem ^= divisor << (bit - 32);
            quotient |= 1 << (bit - 32);
        }
        bit -= 1;
    }
    quotient
}
