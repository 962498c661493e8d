//! Command implementations for foldcrc CLI.

pub mod check;
pub mod probe;
pub mod sum;

pub use check::cmd_check;
pub use probe::cmd_probe;
pub use sum::{SumOptions, cmd_sum};
