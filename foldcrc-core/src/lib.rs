//! # foldcrc Core
//!
//! CRC-32 (ISO-HDLC, the zlib/gzip/PNG/Ethernet checksum) with a scalar
//! lookup-table engine and carry-less multiply folding on 128-bit and 512-bit
//! vector lanes, selected at runtime.
//!
//! - [`constants`]: fold and reduction multipliers derived from the polynomial
//! - [`scalar`]: byte-at-a-time reference engine
//! - [`probe`]: decides whether (and how wide) a call may vectorize
//! - [`dispatch`]: the per-call pipeline and [`Backend`] selection
//! - [`crc`]: streaming [`Crc32`] hasher
//! - [`config`]: backend override (`FOLDCRC_FORCE`)
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Crc32 / mmap::checksum_file                             │
//! ├─────────────────────────────────────────────────────────┤
//! │ dispatch: clamp caps -> select_tier -> fold -> scalar   │
//! ├──────────────────────────────┬──────────────────────────┤
//! │ fold: PCLMULQDQ / VPCLMULQDQ │ scalar: 256-entry table  │
//! │       PMULL                  │                          │
//! ├──────────────────────────────┴──────────────────────────┤
//! │ constants: derived at compile time from 0x04C11DB7      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path produces the same value; the vector tiers only change speed.
//!
//! ## Example
//!
//! ```rust
//! use foldcrc_core::crc::Crc32;
//! use foldcrc_core::dispatch::{self, Backend};
//!
//! // One-shot
//! assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
//!
//! // Raw register, split anywhere
//! let crc = dispatch::update(0xFFFF_FFFF, b"Hello, ");
//! let crc = dispatch::update(crc, b"World!");
//! assert_eq!(!crc, 0xEC4AC3D0);
//!
//! // Pinned backend
//! let mut crc = Crc32::with_backend(Backend::Scalar);
//! crc.update(b"Hello, World!");
//! assert_eq!(crc.finalize(), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod crc;
pub mod dispatch;
pub mod error;
mod fold;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod probe;
pub mod scalar;

// Re-exports for convenience
pub use config::{DispatchConfig, ForceBackend};
pub use crc::Crc32;
pub use dispatch::{Backend, update, update_with};
pub use error::{FoldCrcError, Result};
pub use probe::{ByteOrder, Capabilities, HwFeatures, Tier};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::crc::Crc32;
    pub use crate::dispatch::Backend;
    pub use crate::error::{FoldCrcError, Result};
}
