//! Sum command implementation.

use crate::utils::checksum_stream;
use foldcrc_core::Backend;
use foldcrc_core::mmap::checksum_file_with;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON serializable checksum of one file.
#[derive(Debug, Serialize, Deserialize)]
struct SumJson {
    path: String,
    crc32: String,
    bytes: u64,
    backend: String,
}

/// Options for the sum command.
pub struct SumOptions {
    pub json: bool,
    pub backend: Backend,
    pub mmap: bool,
    pub progress: bool,
}

fn checksum_path(
    path: &Path,
    options: &SumOptions,
) -> Result<(u32, u64), Box<dyn std::error::Error>> {
    if options.mmap && path.as_os_str() != "-" {
        let bytes = fs::metadata(path)?.len();
        let crc = checksum_file_with(path, options.backend)?;
        return Ok((crc, bytes));
    }
    checksum_stream(path, options.backend, options.progress).map_err(Into::into)
}

pub fn cmd_sum(files: &[PathBuf], options: &SumOptions) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("sum: {} file(s) with backend {}", files.len(), options.backend);

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let (crc, bytes) = checksum_path(path, options)?;
        if options.json {
            results.push(SumJson {
                path: path.display().to_string(),
                crc32: format!("{:08x}", crc),
                bytes,
                backend: options.backend.name().to_string(),
            });
        } else {
            println!("{:08x}  {}", crc, path.display());
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}
