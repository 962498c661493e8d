//! Capability probe: decides whether a call may use the folding engine, and
//! at which width.
//!
//! The decision combines three inputs: the byte order, the buffer length, and
//! the carry-less multiply features of the processor. Feature detection runs
//! once per process and is cached.

use std::sync::OnceLock;

/// Width of one narrow (128-bit) lane in bytes.
pub const NARROW_LANE: usize = 16;

/// Width of one wide (512-bit) lane in bytes.
pub const WIDE_LANE: usize = 64;

/// Shortest buffer that may enter the wide tier.
pub const WIDE_MIN_LEN: usize = 4 * WIDE_LANE;

/// Shortest vector run on platforms flagged with
/// [`HwFeatures::costly_short_runs`].
pub const COSTLY_MIN_LEN: usize = 8 * NARROW_LANE;

/// Byte order of the platform the data is folded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the running target.
    pub const fn host() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// Lowercase name, as shown by the CLI.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }
}

/// Carry-less multiply features relevant to the folding engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HwFeatures {
    /// 64x64 carry-less multiply on 128-bit lanes
    /// (x86_64 `pclmulqdq` + `sse4.1`, aarch64 `neon` + `aes`).
    pub clmul128: bool,
    /// Carry-less multiply on 512-bit vectors (x86_64 `avx512f` + `vpclmulqdq`).
    pub clmul512: bool,
    /// Short vector runs lose to the scalar path on this platform, so the
    /// minimum vector length is raised to [`COSTLY_MIN_LEN`].
    pub costly_short_runs: bool,
}

impl HwFeatures {
    /// No vector features at all.
    pub const NONE: Self = Self {
        clmul128: false,
        clmul512: false,
        costly_short_runs: false,
    };

    /// Features of the running processor, detected once and cached.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<HwFeatures> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let features = Self::detect_uncached();
            log::debug!("detected CRC-32 vector features: {:?}", features);
            features
        })
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_uncached() -> Self {
        let clmul128 =
            is_x86_feature_detected!("pclmulqdq") && is_x86_feature_detected!("sse4.1");
        let clmul512 = clmul128
            && is_x86_feature_detected!("avx512f")
            && is_x86_feature_detected!("vpclmulqdq");
        Self {
            clmul128,
            clmul512,
            costly_short_runs: false,
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn detect_uncached() -> Self {
        use std::arch::is_aarch64_feature_detected;

        Self {
            clmul128: is_aarch64_feature_detected!("neon") && is_aarch64_feature_detected!("aes"),
            clmul512: false,
            // With the CRC extension present, runs under eight lanes are
            // faster through the scalar path.
            costly_short_runs: is_aarch64_feature_detected!("crc"),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn detect_uncached() -> Self {
        Self::NONE
    }

    /// Features present in both sets. `costly_short_runs` is a penalty, not a
    /// capability, so it is kept if either side reports it.
    pub const fn intersect(self, other: Self) -> Self {
        Self {
            clmul128: self.clmul128 && other.clmul128,
            clmul512: self.clmul512 && other.clmul512,
            costly_short_runs: self.costly_short_runs || other.costly_short_runs,
        }
    }
}

/// Byte order plus features: everything the probe needs besides the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Byte order the data is interpreted in.
    pub byte_order: ByteOrder,
    /// Available vector features.
    pub features: HwFeatures,
}

impl Capabilities {
    /// Capabilities of the running host.
    pub fn host() -> Self {
        Self {
            byte_order: ByteOrder::host(),
            features: HwFeatures::detect(),
        }
    }

    /// Scalar-only capabilities in host byte order.
    pub const fn scalar() -> Self {
        Self {
            byte_order: ByteOrder::host(),
            features: HwFeatures::NONE,
        }
    }

    /// Restrict to what the running host actually provides.
    ///
    /// A claimed feature the host lacks is dropped, and a big-endian host is
    /// never reported as little-endian.
    pub fn clamp_to_host(self) -> Self {
        let host = Self::host();
        Self {
            byte_order: match host.byte_order {
                ByteOrder::Big => ByteOrder::Big,
                ByteOrder::Little => self.byte_order,
            },
            features: self.features.intersect(host.features),
        }
    }
}

/// Vector width selected for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Scalar only.
    None,
    /// 128-bit lanes.
    Narrow128,
    /// 512-bit lanes, finishing through the 128-bit reduction.
    Wide512,
}

impl Tier {
    /// Lane width in bytes, zero for [`Tier::None`].
    pub const fn lane_width(self) -> usize {
        match self {
            Self::None => 0,
            Self::Narrow128 => NARROW_LANE,
            Self::Wide512 => WIDE_LANE,
        }
    }
}

/// Minimum buffer length for any vector tier under `features`.
pub const fn min_vector_len(features: HwFeatures) -> usize {
    if features.costly_short_runs {
        COSTLY_MIN_LEN
    } else {
        NARROW_LANE
    }
}

/// Pick the tier for a buffer of `len` bytes.
///
/// ```
/// use foldcrc_core::probe::{select_tier, ByteOrder, HwFeatures, Tier};
///
/// let narrow = HwFeatures { clmul128: true, ..HwFeatures::NONE };
/// assert_eq!(select_tier(ByteOrder::Little, 15, narrow), Tier::None);
/// assert_eq!(select_tier(ByteOrder::Little, 16, narrow), Tier::Narrow128);
/// assert_eq!(select_tier(ByteOrder::Big, 4096, narrow), Tier::None);
/// ```
pub const fn select_tier(byte_order: ByteOrder, len: usize, features: HwFeatures) -> Tier {
    if !matches!(byte_order, ByteOrder::Little)
        || !features.clmul128
        || len < min_vector_len(features)
    {
        return Tier::None;
    }
    if features.clmul512 && len >= WIDE_MIN_LEN {
        Tier::Wide512
    } else {
        Tier::Narrow128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NARROW: HwFeatures = HwFeatures {
        clmul128: true,
        clmul512: false,
        costly_short_runs: false,
    };
    const WIDE: HwFeatures = HwFeatures {
        clmul128: true,
        clmul512: true,
        costly_short_runs: false,
    };
    const COSTLY: HwFeatures = HwFeatures {
        clmul128: true,
        clmul512: false,
        costly_short_runs: true,
    };

    #[test]
    fn test_no_features_is_scalar() {
        for len in [0, 16, 4096] {
            assert_eq!(select_tier(ByteOrder::Little, len, HwFeatures::NONE), Tier::None);
        }
    }

    #[test]
    fn test_big_endian_is_scalar() {
        for features in [NARROW, WIDE, COSTLY] {
            for len in [16, 256, 1 << 20] {
                assert_eq!(select_tier(ByteOrder::Big, len, features), Tier::None);
            }
        }
    }

    #[test]
    fn test_narrow_threshold() {
        assert_eq!(select_tier(ByteOrder::Little, 0, NARROW), Tier::None);
        assert_eq!(select_tier(ByteOrder::Little, 15, NARROW), Tier::None);
        assert_eq!(select_tier(ByteOrder::Little, 16, NARROW), Tier::Narrow128);
        assert_eq!(select_tier(ByteOrder::Little, 1 << 20, NARROW), Tier::Narrow128);
    }

    #[test]
    fn test_costly_platform_threshold() {
        assert_eq!(min_vector_len(COSTLY), 128);
        assert_eq!(select_tier(ByteOrder::Little, 16, COSTLY), Tier::None);
        assert_eq!(select_tier(ByteOrder::Little, 127, COSTLY), Tier::None);
        assert_eq!(select_tier(ByteOrder::Little, 128, COSTLY), Tier::Narrow128);
    }

    #[test]
    fn test_wide_threshold() {
        assert_eq!(select_tier(ByteOrder::Little, 16, WIDE), Tier::Narrow128);
        assert_eq!(select_tier(ByteOrder::Little, 255, WIDE), Tier::Narrow128);
        assert_eq!(select_tier(ByteOrder::Little, 256, WIDE), Tier::Wide512);
        assert_eq!(select_tier(ByteOrder::Little, 4096, WIDE), Tier::Wide512);
    }

    #[test]
    fn test_wide_requires_narrow() {
        let wide_only = HwFeatures {
            clmul128: false,
            ..WIDE
        };
        assert_eq!(select_tier(ByteOrder::Little, 4096, wide_only), Tier::None);
    }

    #[test]
    fn test_intersect() {
        assert_eq!(WIDE.intersect(NARROW), NARROW);
        assert_eq!(NARROW.intersect(HwFeatures::NONE), HwFeatures::NONE);
        assert!(NARROW.intersect(COSTLY).costly_short_runs);
    }

    #[test]
    fn test_clamp_never_exceeds_host() {
        let host = Capabilities::host();
        let claimed = Capabilities {
            byte_order: ByteOrder::Little,
            features: WIDE,
        }
        .clamp_to_host();
        assert!(!claimed.features.clmul128 || host.features.clmul128);
        assert!(!claimed.features.clmul512 || host.features.clmul512);
        if host.byte_order == ByteOrder::Big {
            assert_eq!(claimed.byte_order, ByteOrder::Big);
        }
    }

    #[test]
    fn test_detect_is_cached() {
        assert_eq!(HwFeatures::detect(), HwFeatures::detect());
    }

    #[test]
    fn test_lane_width() {
        assert_eq!(Tier::None.lane_width(), 0);
        assert_eq!(Tier::Narrow128.lane_width(), 16);
        assert_eq!(Tier::Wide512.lane_width(), 64);
    }
}
