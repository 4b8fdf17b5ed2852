//! Example: Render a fragment preset offscreen and save it as a PNG.
//!
//! Run with:
//!     cargo run --example render_preview --features tokio -- [preset] [output.png]
//!
//! Presets: uv-gradient, wave, pulse, pointer-circle, checker.

use anyhow::{bail, Context};
use wgsl_playground::playground::{render_preview, run_texture_pipeline, write_image, RenderRequest, TextureRequest};
use wgsl_playground::{presets, GpuContext, PlaygroundConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let preset = args.next().unwrap_or_else(|| "wave".to_string());
    let output = args.next().unwrap_or_else(|| format!("{}.png", preset));
    let (width, height) = (512, 512);

    let config = match std::env::var("PLAYGROUND_CONFIG") {
        Ok(path) => PlaygroundConfig::load(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => PlaygroundConfig::default(),
    };
    let ctx = GpuContext::initialize(&config).await?;
    println!("GPU: {}", ctx.adapter_info().name);

    let pixels = if preset == "checker" {
        let request = TextureRequest {
            width,
            height,
            ..Default::default()
        };
        run_texture_pipeline(&ctx, &request).await?
    } else {
        let Some(fragment) = presets::fragment(&preset) else {
            bail!(
                "unknown preset '{}', expected one of: {}, checker",
                preset,
                presets::FRAGMENT_PRESETS.join(", ")
            );
        };
        let request = RenderRequest {
            fragment: fragment.to_string(),
            entry_point: config.fragment_entry_point.clone(),
            width,
            height,
            frames: 30,
            pointer: [width as f32 / 2.0, height as f32 / 3.0],
            uniforms: preset != "uv-gradient",
            clear: Some(config.clear_color()?),
            ..Default::default()
        };
        render_preview(&ctx, &request).await?
    };

    write_image(&output, width, height, pixels)?;
    println!("Wrote {}", output);
    Ok(())
}
