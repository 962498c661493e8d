//! Dispatch configuration: which backend family the process should use.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{FoldCrcError, Result};

/// Forced backend family, or `Auto` to pick the fastest supported one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ForceBackend {
    /// Fastest supported backend.
    #[default]
    Auto,
    /// Lookup table only.
    Scalar,
    /// 128-bit folding (PCLMULQDQ or PMULL).
    Narrow,
    /// 512-bit folding (VPCLMULQDQ).
    Wide,
}

impl ForceBackend {
    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Scalar => "scalar",
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }
}

impl fmt::Display for ForceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForceBackend {
    type Err = FoldCrcError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "" | "auto" => Ok(Self::Auto),
            "scalar" | "portable" | "table" => Ok(Self::Scalar),
            "narrow" | "pclmul" | "pmull" | "128" => Ok(Self::Narrow),
            "wide" | "vpclmul" | "avx512" | "512" => Ok(Self::Wide),
            _ => Err(FoldCrcError::unknown_backend(s.trim())),
        }
    }
}

/// Process-wide dispatch settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Forced backend family. Always clamped to what the host supports.
    pub force: ForceBackend,
}

impl DispatchConfig {
    /// Environment variable read by [`DispatchConfig::from_env`].
    pub const ENV_VAR: &'static str = "FOLDCRC_FORCE";

    /// No override.
    pub const AUTO: Self = Self {
        force: ForceBackend::Auto,
    };

    /// Force the lookup table.
    pub const SCALAR: Self = Self {
        force: ForceBackend::Scalar,
    };

    /// Read the override from [`Self::ENV_VAR`].
    ///
    /// An unset or empty variable means [`Self::AUTO`]. An unknown name is an
    /// error; callers that must not fail log it and fall back to `AUTO`.
    pub fn from_env() -> Result<Self> {
        match env::var(Self::ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(env::VarError::NotPresent) => Ok(Self::AUTO),
            Err(env::VarError::NotUnicode(raw)) => Err(FoldCrcError::unknown_backend(
                raw.to_string_lossy().into_owned(),
            )),
        }
    }

    /// Parse an override value as written in the environment.
    pub fn parse(value: &str) -> Result<Self> {
        Ok(Self {
            force: value.parse()?,
        })
    }
}
