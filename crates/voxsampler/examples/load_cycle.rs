#![allow(clippy::cast_possible_truncation)]
//! Repeatedly loads a random volume and samples its lower octant.
//!
//! Usage: `cargo run --example load_cycle -- [size] [cycles] [--cpu] [--debug]`
//!
//! Defaults to a 512^3 volume and 1000 cycles. With `--debug`, every GPU call
//! is logged; otherwise set `RUST_LOG=info` to follow the lifecycle.

use std::time::Instant;

use rand::Rng;
use voxsampler::{BackendKind, Sampler, SamplerOptions};

fn main() -> voxsampler::Result<()> {
    let _ = env_logger::try_init();

    let mut positional = Vec::new();
    let mut backend = BackendKind::Gpu;
    let mut debug = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--cpu" => backend = BackendKind::Cpu,
            "--debug" => debug = true,
            _ => positional.push(arg),
        }
    }
    let size: u32 = positional
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or(512);
    let cycles: u32 = positional
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let options = SamplerOptions::new()
        .with_backend(backend)
        .with_debug(debug);
    let mut sampler = Sampler::with_options(options)?;

    let mut volume = vec![0u8; size as usize * size as usize * size as usize];
    rand::thread_rng().fill(&mut volume[..]);

    let half = i64::from(size / 2).max(1);
    let start = Instant::now();
    for cycle in 0..cycles {
        sampler.load(&volume, size, size, size)?;
        let block = sampler.sample_raw(half, half, half, 0, 0, 0, 1.0)?;
        println!("{cycle}: {} bytes", block.len());
    }
    let elapsed = start.elapsed();
    println!(
        "{cycles} cycles in {:.2?} ({:.2?} per cycle)",
        elapsed,
        elapsed / cycles.max(1)
    );

    sampler.cleanup();
    Ok(())
}
