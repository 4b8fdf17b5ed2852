//! Example: Run a compute shader and print its output.
//!
//! Without arguments this runs the built-in squares shader. Pass a WGSL file
//! to run your own; it sees `params.n` at binding 0 and a `u32` storage
//! array at binding 1.
//!
//! Run with:
//!     cargo run --example compute_squares --features tokio -- [shader.wgsl] [n] [workgroup_size]

use anyhow::Context;
use wgsl_playground::playground::{run_compute, ComputeRequest};
use wgsl_playground::{GpuContext, PlaygroundConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut request = ComputeRequest::default();
    if let Some(path) = args.next() {
        request.source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    }
    if let Some(n) = args.next() {
        request.n = n.parse().context("n must be a positive integer")?;
    }
    if let Some(wg) = args.next() {
        request.workgroup_size = wg.parse().context("workgroup size must be a positive integer")?;
    }

    let config = PlaygroundConfig::default();
    request.entry_point = config.compute_entry_point.clone();
    let ctx = GpuContext::initialize(&config).await?;
    println!("GPU: {}\n", ctx.adapter_info().name);

    let report = run_compute(&ctx, &request).await?;
    for line in &report.log {
        println!("{}", line);
    }

    println!("\nFirst values:");
    for (i, value) in report.values.iter().take(32).enumerate() {
        println!("  out[{:>2}] = {}", i, value);
    }

    Ok(())
}
