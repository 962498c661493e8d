//! Runtime dispatch between the scalar engine and the folding engine.
//!
//! [`update_with`] is the whole pipeline for one call: clamp the capabilities
//! to the host, pick a tier, fold the lane-aligned prefix, and finish the
//! remainder with the lookup table. [`Backend`] names a kernel family and is
//! how callers (and the CLI) pin a particular path.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::config::{DispatchConfig, ForceBackend};
use crate::error::{FoldCrcError, Result};
use crate::fold;
use crate::probe::{ByteOrder, Capabilities, HwFeatures, Tier, select_tier};
use crate::scalar;

/// Advance the raw CRC register over `data` using the process-wide backend.
///
/// # Arguments
///
/// * `crc` - Running register (already inverted by the caller)
/// * `data` - Data to process
///
/// # Returns
///
/// Updated register (still inverted). An empty slice returns `crc`.
#[inline]
pub fn update(crc: u32, data: &[u8]) -> u32 {
    Backend::active().update(crc, data)
}

/// Advance the raw CRC register over `data` using at most `caps`.
///
/// `caps` is first clamped to the running host, so claiming a feature the
/// processor lacks only falls back to a narrower path. The result is equal to
/// [`scalar::update`] for every input.
pub fn update_with(crc: u32, data: &[u8], caps: Capabilities) -> u32 {
    let caps = caps.clamp_to_host();
    match select_tier(caps.byte_order, data.len(), caps.features) {
        Tier::None => scalar::update(crc, data),
        tier => {
            // SAFETY: `tier` was selected for this exact slice from
            // capabilities clamped to the running host.
            let (crc, consumed) = unsafe { fold::fold(tier, crc, data) };
            scalar::update(crc, &data[consumed..])
        }
    }
}

/// A concrete kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Byte-at-a-time lookup table.
    Scalar,
    /// x86_64 PCLMULQDQ, 128-bit lanes.
    Pclmul,
    /// x86_64 AVX-512 VPCLMULQDQ, 512-bit lanes above the wide threshold.
    Vpclmul,
    /// aarch64 NEON PMULL, 128-bit lanes.
    Pmull,
}

impl Backend {
    /// Every backend, fastest first.
    pub const ALL: [Backend; 4] = [Self::Vpclmul, Self::Pclmul, Self::Pmull, Self::Scalar];

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Pclmul => "pclmul",
            Self::Vpclmul => "vpclmul",
            Self::Pmull => "pmull",
        }
    }

    /// Whether the running host can execute this backend.
    pub fn is_supported(self) -> bool {
        let features = HwFeatures::detect();
        match self {
            Self::Scalar => true,
            Self::Pclmul => cfg!(target_arch = "x86_64") && features.clmul128,
            Self::Vpclmul => cfg!(target_arch = "x86_64") && features.clmul512,
            Self::Pmull => cfg!(target_arch = "aarch64") && features.clmul128,
        }
    }

    /// Backends the running host supports, fastest first. Never empty.
    pub fn supported() -> Vec<Backend> {
        Self::ALL.into_iter().filter(|b| b.is_supported()).collect()
    }

    /// Fastest supported backend.
    pub fn detect() -> Self {
        Self::ALL
            .into_iter()
            .find(|b| b.is_supported())
            .unwrap_or(Self::Scalar)
    }

    /// Backend for `config`, clamped to what the host supports.
    pub fn select(config: &DispatchConfig) -> Self {
        let narrow = || {
            [Self::Pclmul, Self::Pmull]
                .into_iter()
                .find(|b| b.is_supported())
                .unwrap_or(Self::Scalar)
        };
        let selected = match config.force {
            ForceBackend::Auto => Self::detect(),
            ForceBackend::Scalar => Self::Scalar,
            ForceBackend::Narrow => narrow(),
            ForceBackend::Wide if Self::Vpclmul.is_supported() => Self::Vpclmul,
            ForceBackend::Wide => narrow(),
        };
        log::debug!(
            "CRC-32 backend {} selected (forced: {})",
            selected,
            config.force.as_str()
        );
        selected
    }

    /// Backend used by [`update`] and [`crate::Crc32::new`].
    ///
    /// Chosen on first use from `FOLDCRC_FORCE` and the host features, then
    /// fixed for the life of the process.
    pub fn active() -> Self {
        static ACTIVE: OnceLock<Backend> = OnceLock::new();
        *ACTIVE.get_or_init(|| {
            let config = DispatchConfig::from_env().unwrap_or_else(|e| {
                log::warn!("ignoring {}: {}", DispatchConfig::ENV_VAR, e);
                DispatchConfig::AUTO
            });
            Self::select(&config)
        })
    }

    /// Capabilities this backend may use on the running host.
    ///
    /// An unsupported backend maps to scalar-only capabilities.
    pub fn capabilities(self) -> Capabilities {
        if !self.is_supported() {
            return Capabilities::scalar();
        }
        let features = match self {
            Self::Scalar => HwFeatures::NONE,
            Self::Pclmul | Self::Pmull => HwFeatures {
                clmul128: true,
                ..HwFeatures::NONE
            },
            Self::Vpclmul => HwFeatures {
                clmul128: true,
                clmul512: true,
                ..HwFeatures::NONE
            },
        };
        Capabilities {
            byte_order: ByteOrder::host(),
            features,
        }
        .clamp_to_host()
    }

    /// Advance the raw CRC register over `data` with this backend.
    #[inline]
    pub fn update(self, crc: u32, data: &[u8]) -> u32 {
        update_with(crc, data, self.capabilities())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = FoldCrcError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| FoldCrcError::unknown_backend(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data(len: usize) -> Vec<u8> {
        let mut seed: u64 = 0x123456789ABCDEF0;
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                (seed >> 56) as u8
            })
            .collect()
    }

    #[test]
    fn test_update_known_answers() {
        assert_eq!(!update(!0, b""), 0);
        assert_eq!(!update(!0, b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_empty_is_identity() {
        for backend in Backend::supported() {
            assert_eq!(backend.update(0x1234_5678, b""), 0x1234_5678);
        }
    }

    #[test]
    fn test_update_with_matches_scalar() {
        let data = test_data(2048);
        let host = Capabilities::host();
        for len in [0, 1, 15, 16, 17, 100, 128, 255, 256, 257, 1000, 2048] {
            let slice = &data[..len];
            assert_eq!(
                update_with(!0, slice, host),
                scalar::update(!0, slice),
                "mismatch at length {}",
                len
            );
        }
    }

    #[test]
    fn test_big_endian_capabilities_take_scalar_path() {
        let data = test_data(1024);
        let caps = Capabilities {
            byte_order: ByteOrder::Big,
            features: HwFeatures::detect(),
        };
        assert_eq!(update_with(7, &data, caps), scalar::update(7, &data));
    }

    #[test]
    fn test_forged_features_are_clamped() {
        // Claiming every feature must still produce the scalar result, even
        // on a host without carry-less multiply.
        let data = test_data(4096);
        let caps = Capabilities {
            byte_order: ByteOrder::Little,
            features: HwFeatures {
                clmul128: true,
                clmul512: true,
                costly_short_runs: false,
            },
        };
        assert_eq!(update_with(!0, &data, caps), scalar::update(!0, &data));
    }

    #[test]
    fn test_supported_always_contains_scalar() {
        let supported = Backend::supported();
        assert!(supported.contains(&Backend::Scalar));
        assert!(supported.contains(&Backend::detect()));
    }

    #[test]
    fn test_unsupported_backend_is_scalar_only() {
        for backend in Backend::ALL {
            if !backend.is_supported() {
                assert_eq!(backend.capabilities().features, HwFeatures::NONE);
            }
        }
        assert!(!Backend::Scalar.capabilities().features.clmul128);
    }

    #[test]
    fn test_select_is_clamped() {
        let scalar = DispatchConfig {
            force: ForceBackend::Scalar,
        };
        assert_eq!(Backend::select(&scalar), Backend::Scalar);

        for force in [ForceBackend::Auto, ForceBackend::Narrow, ForceBackend::Wide] {
            let selected = Backend::select(&DispatchConfig { force });
            assert!(selected.is_supported(), "{:?} selected {}", force, selected);
        }
        assert_eq!(Backend::select(&DispatchConfig::AUTO), Backend::detect());
    }

    #[test]
    fn test_active_is_stable() {
        assert_eq!(Backend::active(), Backend::active());
        assert!(Backend::active().is_supported());
    }

    #[test]
    fn test_backend_names() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>().unwrap(), backend);
            assert_eq!(backend.to_string(), backend.name());
        }
        assert_eq!("PCLMUL".parse::<Backend>().unwrap(), Backend::Pclmul);
        assert!(matches!(
            "sse2".parse::<Backend>(),
            Err(FoldCrcError::UnknownBackend { .. })
        ));
    }
}
