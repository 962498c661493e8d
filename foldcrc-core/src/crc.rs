//! Streaming CRC-32 hasher.
//!
//! Wraps the raw register threaded through [`crate::dispatch`] with the
//! standard seed and final complement.

use std::io::{self, Read};

use crate::dispatch::Backend;
use crate::error::{FoldCrcError, Result};

/// Initial register value and final XOR.
const INIT: u32 = 0xFFFF_FFFF;

/// Read buffer size for [`Crc32::update_reader`].
const READ_BUF_SIZE: usize = 64 * 1024;

/// CRC-32 calculator (IEEE 802.3 / ISO-HDLC).
///
/// Parameters:
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
/// - Reflected input: Yes
/// - Reflected output: Yes
///
/// # Example
///
/// ```
/// use foldcrc_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
    backend: Backend,
}

impl Crc32 {
    /// Create a new CRC-32 calculator using the process-wide backend.
    pub fn new() -> Self {
        Self::with_backend(Backend::active())
    }

    /// Create a calculator pinned to `backend`.
    ///
    /// A backend the host does not support computes through the lookup table.
    pub fn with_backend(backend: Backend) -> Self {
        Self { crc: INIT, backend }
    }

    /// Backend this calculator dispatches to.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = INIT;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.crc = self.backend.update(self.crc, data);
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ INIT
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ INIT
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }

    /// Feed everything `reader` yields into the CRC.
    ///
    /// Returns the number of bytes read. Interrupted reads are retried.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> Result<u64> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.update(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    }

    /// Check the current value against `expected`.
    pub fn verify(&self, expected: u32) -> Result<()> {
        let computed = self.value();
        if computed == expected {
            Ok(())
        } else {
            Err(FoldCrcError::crc_mismatch(expected, computed))
        }
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}
