//! Check command implementation.

use crate::utils::checksum_stream;
use foldcrc_core::Backend;
use foldcrc_core::error::{FoldCrcError, parse_checksum};
use std::path::Path;

pub fn cmd_check(
    file: &Path,
    expected: &str,
    backend: Backend,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = parse_checksum(expected)?;
    let (computed, bytes) = checksum_stream(file, backend, false)?;

    if computed != expected {
        return Err(FoldCrcError::crc_mismatch(expected, computed).into());
    }

    println!("{}: OK ({:08x}, {} bytes)", file.display(), computed, bytes);
    Ok(())
}
