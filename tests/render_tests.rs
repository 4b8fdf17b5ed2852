//! Integration tests for render jobs, offscreen targets, and the texture pipeline.

use wgsl_playground::gpu::{Binding, GpuContext, JobError, OffscreenTarget, RenderJob};
use wgsl_playground::playground::{render_preview, run_texture_pipeline, RenderRequest, TextureRequest};
use wgsl_playground::presets;

async fn create_gpu_context() -> Option<GpuContext> {
    GpuContext::new(wgpu::Features::empty()).await.ok()
}

fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn assert_close(actual: [u8; 4], expected: [u8; 3], tolerance: u8) {
    for c in 0..3 {
        assert!(
            actual[c].abs_diff(expected[c]) <= tolerance,
            "channel {} is {}, expected {} (pixel {:?})",
            c,
            actual[c],
            expected[c],
            actual
        );
    }
}

#[tokio::test]
async fn test_uv_gradient_orientation() {
    if let Some(ctx) = create_gpu_context().await {
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 16, 16));
        job.set_fragment(presets::UV_GRADIENT_FRAGMENT);
        job.build().await.unwrap();
        job.render_frame(None).unwrap();

        let pixels = job.target().read_pixels().await.unwrap();
        assert_eq!(pixels.len(), 16 * 16 * 4);

        let top_left = pixel(&pixels, 16, 0, 0);
        assert!(top_left[0] < 32 && top_left[1] > 224, "{:?}", top_left);
        let bottom_right = pixel(&pixels, 16, 15, 15);
        assert!(bottom_right[0] > 224 && bottom_right[1] < 32, "{:?}", bottom_right);
        assert_eq!(top_left[3], 255);
    }
}

#[tokio::test]
async fn test_bind_before_build_fails() {
    if let Some(ctx) = create_gpu_context().await {
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 8, 8));
        job.set_fragment(presets::WAVE_FRAGMENT);
        assert!(matches!(job.bind(&[]).await, Err(JobError::PipelineNotReady)));
    }
}

#[tokio::test]
async fn test_replacing_fragment_requires_rebuild() {
    if let Some(ctx) = create_gpu_context().await {
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 8, 8));
        job.set_fragment(presets::UV_GRADIENT_FRAGMENT);
        job.build().await.unwrap();
        job.render_frame(None).unwrap();

        job.set_fragment(presets::UV_GRADIENT_FRAGMENT);
        assert!(matches!(job.render_frame(None), Err(JobError::PipelineNotReady)));

        job.build().await.unwrap();
        assert!(job.render_frame(None).is_ok());
    }
}

#[tokio::test]
async fn test_pulse_preview_at_time_zero() {
    if let Some(ctx) = create_gpu_context().await {
        let request = RenderRequest {
            fragment: presets::PULSE_FRAGMENT.to_string(),
            width: 8,
            height: 8,
            ..Default::default()
        };
        let pixels = render_preview(&ctx, &request).await.unwrap();

        // sin(0) = 0 puts the pulse halfway: green = mix(0.2, 1.0, 0.5).
        for y in 0..8 {
            for x in 0..8 {
                let p = pixel(&pixels, 8, x, y);
                assert!(p[1].abs_diff(153) <= 2, "green at ({}, {}) is {}", x, y, p[1]);
            }
        }
    }
}

#[tokio::test]
async fn test_pointer_circle_follows_pointer() {
    if let Some(ctx) = create_gpu_context().await {
        let request = RenderRequest {
            fragment: presets::POINTER_CIRCLE_FRAGMENT.to_string(),
            width: 64,
            height: 64,
            pointer: [32.0, 32.0],
            ..Default::default()
        };
        let pixels = render_preview(&ctx, &request).await.unwrap();

        assert_close(pixel(&pixels, 64, 32, 32), [255, 128, 51], 2);
        assert_close(pixel(&pixels, 64, 0, 0), [51, 128, 255], 2);
    }
}

#[tokio::test]
async fn test_static_preview_without_uniforms() {
    if let Some(ctx) = create_gpu_context().await {
        let request = RenderRequest {
            fragment: presets::UV_GRADIENT_FRAGMENT.to_string(),
            width: 4,
            height: 4,
            uniforms: false,
            frames: 2,
            ..Default::default()
        };
        let pixels = render_preview(&ctx, &request).await.unwrap();
        assert_eq!(pixels.len(), 4 * 4 * 4);
    }
}

#[tokio::test]
async fn test_texture_pipeline_checkerboard() {
    if let Some(ctx) = create_gpu_context().await {
        let request = TextureRequest {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let pixels = run_texture_pipeline(&ctx, &request).await.unwrap();
        assert_eq!(pixels.len(), 64 * 64 * 4);

        // The fragment stage's uv.y runs bottom to top, so output row 8
        // samples texel row 55.
        assert_close(pixel(&pixels, 64, 8, 8), [32, 128, 255], 2);
        assert_close(pixel(&pixels, 64, 40, 8), [255, 32, 64], 2);
        assert_close(pixel(&pixels, 64, 8, 40), [255, 32, 64], 2);
    }
}

#[tokio::test]
async fn test_malformed_fragment_is_reported() {
    if let Some(ctx) = create_gpu_context().await {
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 8, 8));
        job.set_fragment("@fragment fn fmain(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> { return uv; ");

        match job.build().await {
            Err(JobError::ShaderCompile(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected a compile failure, got {:?}", other),
        }
        assert!(matches!(job.render_frame(None), Err(JobError::PipelineNotReady)));
    }
}

#[tokio::test]
async fn test_unbound_uniforms_fail_the_frame() {
    if let Some(ctx) = create_gpu_context().await {
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 8, 8));
        job.set_fragment(presets::WAVE_FRAGMENT);
        job.build().await.unwrap();

        assert!(matches!(job.render_frame(None), Err(JobError::Validation(_))));

        // The job stays usable once the uniforms are bound.
        let uniforms = ctx.make_buffer(
            "uniforms",
            32,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            None,
        );
        job.bind(&[Binding::buffer(&uniforms)]).await.unwrap();
        assert!(job.render_frame(None).is_ok());
    }
}

#[tokio::test]
async fn test_half_float_target_reads_full_frame() {
    if let Some(ctx) = create_gpu_context().await {
        let target = OffscreenTarget::with_format(&ctx, 8, 8, wgpu::TextureFormat::Rgba16Float).unwrap();
        let mut job = RenderJob::new(&ctx, target);
        job.set_fragment(presets::UV_GRADIENT_FRAGMENT);
        job.build().await.unwrap();
        job.render_frame(None).unwrap();

        let pixels = job.target().read_pixels().await.unwrap();
        assert_eq!(pixels.len(), 8 * 8 * 8);

        // Alpha of the last pixel is 1.0 in f16.
        let alpha = u16::from_le_bytes([pixels[pixels.len() - 2], pixels[pixels.len() - 1]]);
        assert_eq!(alpha, 0x3c00);
    }
}
