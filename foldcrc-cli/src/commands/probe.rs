//! Probe command implementation.

use foldcrc_core::probe::{WIDE_MIN_LEN, min_vector_len};
use foldcrc_core::{Backend, Capabilities};
use serde::{Deserialize, Serialize};

/// JSON output for the probe command.
#[derive(Debug, Serialize, Deserialize)]
struct ProbeJson {
    byte_order: String,
    clmul128: bool,
    clmul512: bool,
    costly_short_runs: bool,
    min_vector_len: usize,
    wide_min_len: usize,
    supported: Vec<String>,
    active: String,
}

impl ProbeJson {
    fn detect() -> Self {
        let caps = Capabilities::host();
        Self {
            byte_order: caps.byte_order.as_str().to_string(),
            clmul128: caps.features.clmul128,
            clmul512: caps.features.clmul512,
            costly_short_runs: caps.features.costly_short_runs,
            min_vector_len: min_vector_len(caps.features),
            wide_min_len: WIDE_MIN_LEN,
            supported: Backend::supported()
                .into_iter()
                .map(|b| b.name().to_string())
                .collect(),
            active: Backend::active().name().to_string(),
        }
    }
}

pub fn cmd_probe(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let probe = ProbeJson::detect();

    if json {
        println!("{}", serde_json::to_string_pretty(&probe)?);
        return Ok(());
    }

    println!("Byte order:        {}", probe.byte_order);
    println!("128-bit clmul:     {}", probe.clmul128);
    println!("512-bit clmul:     {}", probe.clmul512);
    println!("Costly short runs: {}", probe.costly_short_runs);
    println!("Min vector length: {} bytes", probe.min_vector_len);
    println!("Wide tier from:    {} bytes", probe.wide_min_len);
    println!("Backends:          {}", probe.supported.join(", "));
    println!("Active backend:    {}", probe.active);
    Ok(())
}
