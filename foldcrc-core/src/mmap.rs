//! Memory-mapped file checksums.
//!
//! The file is mapped read-only and handed to the hasher as one slice, so a
//! large file takes the widest tier for all but its last few bytes.
//!
//! # Example
//!
//! ```no_run
//! use foldcrc_core::mmap::checksum_file;
//!
//! let crc = checksum_file("image.iso")?;
//! println!("{:08x}", crc);
//! # Ok::<(), foldcrc_core::error::FoldCrcError>(())
//! ```
//!
//! # Safety
//!
//! Memory-mapped files can be dangerous if the underlying file is modified by
//! another process while mapped. The mapping lives only for the duration of
//! one call.

use crate::crc::Crc32;
use crate::dispatch::Backend;
use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// CRC-32 of the file at `path` using the process-wide backend.
///
/// # Errors
///
/// Returns [`crate::error::FoldCrcError::Io`] if the file cannot be opened,
/// inspected, or mapped.
pub fn checksum_file<P: AsRef<Path>>(path: P) -> Result<u32> {
    checksum_file_with(path, Backend::active())
}

/// CRC-32 of the file at `path` using `backend`.
///
/// Zero-length files are not mapped and return `0`.
pub fn checksum_file_with<P: AsRef<Path>>(path: P, backend: Backend) -> Result<u32> {
    let file = File::open(path.as_ref())?;
    let mut crc = Crc32::with_backend(backend);
    if file.metadata()?.len() == 0 {
        return Ok(crc.finalize());
    }

    // SAFETY: read-only mapping that is dropped before returning; the caller
    // is responsible for the file not being truncated while it is hashed.
    let mmap = unsafe { Mmap::map(&file)? };
    log::debug!(
        "hashing {} mapped bytes from {}",
        mmap.len(),
        path.as_ref().display()
    );
    crc.update(&mmap);
    Ok(crc.finalize())
}
