//! The three playground runs: compute readback, fragment preview, and a
//! compute-to-texture pipeline sampled by a fragment shader.

use std::path::Path;
use wgpu::BufferUsages;

use crate::config::ConfigError;
use crate::gpu::{
    align4, Binding, ComputeJob, DispatchDims, GpuContext, GpuError, GpuTexture, JobError,
    OffscreenTarget, RenderJob, DEFAULT_COMPUTE_ENTRY, DEFAULT_FRAGMENT_ENTRY,
};
use crate::presenter::AnimationLoop;
use crate::presets;

/// Errors that can occur during a playground run.
#[derive(Debug, thiserror::Error)]
pub enum PlaygroundError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Job error: {0}")]
    Job(#[from] JobError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Inputs of a compute run. The shader sees `params.n` at binding 0 and a
/// `u32` storage array at binding 1.
#[derive(Debug, Clone)]
pub struct ComputeRequest {
    pub source: String,
    pub entry_point: String,
    /// Number of output elements.
    pub n: u32,
    /// Workgroup size the shader declares; only used to size the dispatch.
    pub workgroup_size: u32,
    /// Keep only the first values of the output; `None` keeps all `n`.
    pub preview_len: Option<usize>,
}

impl Default for ComputeRequest {
    fn default() -> Self {
        Self {
            source: presets::SQUARES_COMPUTE.to_string(),
            entry_point: DEFAULT_COMPUTE_ENTRY.to_string(),
            n: 256,
            workgroup_size: presets::SQUARES_WORKGROUP_SIZE,
            preview_len: None,
        }
    }
}

/// Result of [`run_compute`].
#[derive(Debug, Clone, Default)]
pub struct ComputeReport {
    pub values: Vec<u32>,
    pub workgroups: u32,
    /// Progress messages in the order they happened.
    pub log: Vec<String>,
}

/// Build, bind, dispatch, and read back a compute shader.
pub async fn run_compute(ctx: &GpuContext, request: &ComputeRequest) -> Result<ComputeReport, PlaygroundError> {
    if request.n == 0 || request.workgroup_size == 0 {
        return Err(PlaygroundError::InvalidRequest(format!(
            "n ({}) and workgroup size ({}) must be positive",
            request.n, request.workgroup_size
        )));
    }

    let mut report = ComputeReport::default();
    let mut job = ComputeJob::with_entry_point(ctx, request.source.as_str(), request.entry_point.as_str());

    let params = [request.n, 0, 0, 0];
    let params_buf = job.make_buffer(
        "compute_params",
        std::mem::size_of_val(&params) as u64,
        BufferUsages::UNIFORM,
        Some(bytemuck::cast_slice(&params)),
    );
    let out_bytes = align4(request.n as u64 * 4);
    let out_buf = job.make_buffer(
        "compute_output",
        out_bytes,
        BufferUsages::STORAGE | BufferUsages::COPY_SRC,
        None,
    );

    report.log.push("Building compute pipeline...".to_string());
    job.build().await?;
    report.log.push("Compute pipeline built.".to_string());

    let bind_group = job
        .bind(&[Binding::buffer(&params_buf).at(0), Binding::buffer(&out_buf).at(1)])
        .await?;

    let dims = DispatchDims::covering(request.n, request.workgroup_size);
    report.workgroups = dims.x;
    report.log.push(format!("Dispatching {} workgroups...", dims.x));
    job.dispatch(&bind_group, dims)?;

    let mut values: Vec<u32> = job.readback_as(&out_buf, Some(request.n as usize)).await?;
    if let Some(len) = request.preview_len {
        values.truncate(len);
    }
    report.values = values;
    report.log.push(format!(
        "Compute shader ran successfully for N={}, wgSize={}.",
        request.n, request.workgroup_size
    ));
    log::info!("Compute run finished: n={}, workgroups={}", request.n, report.workgroups);
    Ok(report)
}

/// Inputs of an offscreen fragment preview.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub fragment: String,
    pub entry_point: String,
    pub width: u32,
    pub height: u32,
    /// Frames to draw; pixels of the last one are returned.
    pub frames: u32,
    /// Time step between frames, in frames per second.
    pub fps: f32,
    /// Pointer position in pixels.
    pub pointer: [f32; 2],
    /// Whether the shader reads frame uniforms at binding 0.
    pub uniforms: bool,
    pub clear: Option<wgpu::Color>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            fragment: presets::WAVE_FRAGMENT.to_string(),
            entry_point: DEFAULT_FRAGMENT_ENTRY.to_string(),
            width: 256,
            height: 256,
            frames: 1,
            fps: 60.0,
            pointer: [0.0, 0.0],
            uniforms: true,
            clear: None,
        }
    }
}

/// Render a fragment shader offscreen and return RGBA pixels, rows top to bottom.
pub async fn render_preview(ctx: &GpuContext, request: &RenderRequest) -> Result<Vec<u8>, PlaygroundError> {
    if request.frames == 0 || request.fps <= 0.0 {
        return Err(PlaygroundError::InvalidRequest(
            "frames and fps must be positive".to_string(),
        ));
    }

    let target = OffscreenTarget::new(ctx, request.width, request.height);
    let mut job = RenderJob::with_entry_point(ctx, target, request.entry_point.as_str());
    job.set_fragment(request.fragment.as_str());

    let job = if request.uniforms {
        let mut anim = AnimationLoop::start(ctx, job).await?;
        anim.set_pointer(request.pointer[0], request.pointer[1]);
        if let Some(clear) = request.clear {
            anim.set_clear_color(clear);
        }
        for i in 0..request.frames {
            anim.frame_at(i as f32 / request.fps)?;
        }
        anim.into_job()
    } else {
        job.build().await?;
        for _ in 0..request.frames {
            job.render_frame(request.clear)?;
        }
        job
    };

    log::info!(
        "Rendered {} preview frames at {}x{}",
        request.frames,
        request.width,
        request.height
    );
    Ok(job.target().read_pixels().await?)
}

/// Inputs of the compute-to-texture run.
#[derive(Debug, Clone)]
pub struct TextureRequest {
    /// Writes the rgba8unorm storage texture at binding 0.
    pub compute: String,
    /// Samples the texture at binding 0 with the sampler at binding 1.
    pub fragment: String,
    pub width: u32,
    pub height: u32,
    pub workgroup_edge: u32,
}

impl Default for TextureRequest {
    fn default() -> Self {
        Self {
            compute: presets::CHECKER_TEXTURE_COMPUTE.to_string(),
            fragment: presets::SAMPLE_TEXTURE_FRAGMENT.to_string(),
            width: 256,
            height: 256,
            workgroup_edge: presets::CHECKER_WORKGROUP_EDGE,
        }
    }
}

/// Fill a storage texture with a compute shader, then draw it through a
/// fragment shader. Returns the RGBA pixels of the drawn frame.
pub async fn run_texture_pipeline(
    ctx: &GpuContext,
    request: &TextureRequest,
) -> Result<Vec<u8>, PlaygroundError> {
    if request.width == 0 || request.height == 0 || request.workgroup_edge == 0 {
        return Err(PlaygroundError::InvalidRequest(
            "texture size and workgroup edge must be positive".to_string(),
        ));
    }

    let texture = GpuTexture::for_storage(&ctx.device, "compute_texture", request.width, request.height);

    let mut compute = ComputeJob::new(ctx, request.compute.as_str());
    compute.build().await?;
    let compute_group = compute
        .bind(&[Binding::storage_texture(texture.view())])
        .await?;
    let dims = DispatchDims::xy(
        request.width.div_ceil(request.workgroup_edge),
        request.height.div_ceil(request.workgroup_edge),
    );
    compute.dispatch(&compute_group, dims)?;

    let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("texture_sampler"),
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let target = OffscreenTarget::new(ctx, request.width, request.height);
    let mut render = RenderJob::new(ctx, target);
    render.set_fragment(request.fragment.as_str());
    render
        .build_and_bind(&[Binding::texture(texture.view()), Binding::sampler(&sampler)])
        .await?;
    render.render_frame(None)?;

    log::info!("Texture pipeline rendered {}x{}", request.width, request.height);
    Ok(render.target().read_pixels().await?)
}

/// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional) into a color.
pub fn parse_hex_color(hex: &str) -> Option<wgpu::Color> {
    let hex = hex.trim().trim_start_matches('#');
    if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| -> Option<f64> {
        Some(u8::from_str_radix(&hex[i..i + 2], 16).ok()? as f64 / 255.0)
    };
    let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
    Some(wgpu::Color {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a,
    })
}

/// Save tightly packed RGBA pixels as a PNG (or any format `image` infers
/// from the extension).
pub fn write_image<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<(), PlaygroundError> {
    let len = pixels.len();
    let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        PlaygroundError::InvalidRequest(format!("{} bytes do not fill {}x{} RGBA", len, width, height))
    })?;
    image.save(path.as_ref())?;
    log::info!("Wrote {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        let c = parse_hex_color("#00ff88").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0.0, 1.0, 136.0 / 255.0, 1.0));
        let c = parse_hex_color("ffffff").unwrap();
        assert_eq!((c.r, c.g, c.b), (1.0, 1.0, 1.0));
        let c = parse_hex_color("#00000000").unwrap();
        assert_eq!(c.a, 0.0);
        assert!(parse_hex_color("invalid").is_none());
        assert!(parse_hex_color("#12345").is_none());
    }

    #[test]
    fn test_request_defaults() {
        let compute = ComputeRequest::default();
        assert_eq!(compute.n, 256);
        assert_eq!(compute.workgroup_size, 64);
        assert_eq!(compute.entry_point, "main");

        let render = RenderRequest::default();
        assert_eq!(render.frames, 1);
        assert!(render.uniforms);
        assert_eq!(TextureRequest::default().workgroup_edge, 8);
    }

    #[tokio::test]
    async fn test_zero_sized_requests_are_rejected() {
        let Ok(ctx) = GpuContext::new(wgpu::Features::empty()).await else { return };

        let request = ComputeRequest {
            n: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_compute(&ctx, &request).await,
            Err(PlaygroundError::InvalidRequest(_))
        ));

        let request = RenderRequest {
            frames: 0,
            ..Default::default()
        };
        assert!(matches!(
            render_preview(&ctx, &request).await,
            Err(PlaygroundError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_write_image_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let pixels: Vec<u8> = (0..2 * 2).flat_map(|i| [i * 60, 0, 255 - i * 60, 255]).collect();

        write_image(&path, 2, 2, pixels.clone()).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.into_raw(), pixels);
    }

    #[test]
    fn test_write_image_rejects_short_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_image(dir.path().join("bad.png"), 4, 4, vec![0; 8]);
        assert!(matches!(result, Err(PlaygroundError::InvalidRequest(_))));
    }
}
