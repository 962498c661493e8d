//! Utility functions for the CLI.

use foldcrc_core::{Backend, Crc32, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io;
use std::path::Path;

/// Path that stands for standard input.
const STDIN_PATH: &str = "-";

/// Create a byte-count progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Stream `path` (or standard input for `-`) through a hasher.
///
/// Returns the CRC-32 and the number of bytes read.
pub fn checksum_stream(path: &Path, backend: Backend, progress: bool) -> Result<(u32, u64)> {
    let mut crc = Crc32::with_backend(backend);

    let bytes = if path.as_os_str() == STDIN_PATH {
        crc.update_reader(io::stdin().lock())?
    } else {
        let file = File::open(path)?;
        let pb = create_progress_bar(file.metadata()?.len(), progress);
        pb.set_message(path.display().to_string());
        let bytes = crc.update_reader(pb.wrap_read(file))?;
        pb.finish_and_clear();
        bytes
    };

    Ok((crc.finalize(), bytes))
}
