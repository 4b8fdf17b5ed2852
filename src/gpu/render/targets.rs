//! Render targets: where a render job draws each frame.

use std::sync::Arc;
use wgpu::{Device, Queue, SurfaceTexture, TextureFormat, TextureView};

use crate::gpu::textures::{pixel_size, GpuTexture};
use crate::gpu::{GpuContext, JobError};

/// The texture a single frame is drawn into.
pub struct TargetFrame {
    view: TextureView,
    surface: Option<SurfaceTexture>,
}

impl TargetFrame {
    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Present the frame if it came from a surface.
    pub fn present(self) {
        if let Some(surface) = self.surface {
            surface.present();
        }
    }
}

/// Something a render job can draw into.
pub trait RenderTarget {
    /// Color format pipelines must target.
    fn format(&self) -> TextureFormat;

    /// Size in pixels.
    fn size(&self) -> (u32, u32);

    /// Get the texture for the next frame.
    fn acquire(&mut self) -> Result<TargetFrame, JobError>;
}

/// An offscreen texture whose pixels can be read back.
pub struct OffscreenTarget {
    device: Arc<Device>,
    queue: Arc<Queue>,
    texture: GpuTexture,
    format: TextureFormat,
}

impl OffscreenTarget {
    /// Create an `Rgba8Unorm` target.
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        Self::create(ctx, width, height, TextureFormat::Rgba8Unorm)
    }

    /// Create a target in `format`.
    ///
    /// Fails with [`JobError::UnsupportedFormat`] when the format's pixels
    /// cannot be copied back one by one.
    pub fn with_format(
        ctx: &GpuContext,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<Self, JobError> {
        pixel_size(format)?;
        Ok(Self::create(ctx, width, height, format))
    }

    fn create(ctx: &GpuContext, width: u32, height: u32, format: TextureFormat) -> Self {
        let texture = GpuTexture::for_output(&ctx.device, "offscreen_target", width.max(1), height.max(1), format);
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            texture,
            format,
        }
    }

    /// Recreate the texture at a new size. Previous contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width.max(1), height.max(1)) == self.size() {
            return;
        }
        self.texture = GpuTexture::for_output(&self.device, "offscreen_target", width.max(1), height.max(1), self.format);
    }

    pub fn texture(&self) -> &GpuTexture {
        &self.texture
    }

    /// Read back the last rendered frame, rows top to bottom, with as many
    /// bytes per pixel as the target format holds.
    pub async fn read_pixels(&self) -> Result<Vec<u8>, JobError> {
        self.texture.read_pixels(&self.device, &self.queue).await
    }
}

impl RenderTarget for OffscreenTarget {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    fn acquire(&mut self) -> Result<TargetFrame, JobError> {
        Ok(TargetFrame {
            view: self
                .texture
                .texture()
                .create_view(&wgpu::TextureViewDescriptor::default()),
            surface: None,
        })
    }
}

/// A window surface configured for the context's device.
pub struct SurfaceTarget {
    device: Arc<Device>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl SurfaceTarget {
    /// Configure `surface` with its preferred format and opaque alpha.
    pub fn new(
        ctx: &GpuContext,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, JobError> {
        let mut config = surface
            .get_default_config(&ctx.adapter, width.max(1), height.max(1))
            .ok_or(JobError::UnsupportedSurface)?;

        let caps = surface.get_capabilities(&ctx.adapter);
        if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            config.alpha_mode = wgpu::CompositeAlphaMode::Opaque;
        }
        surface.configure(&ctx.device, &config);
        log::info!(
            "Surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            device: ctx.device.clone(),
            surface,
            config,
        })
    }

    /// Reconfigure for a new drawable size, clamped to at least 1x1.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }
}

impl RenderTarget for SurfaceTarget {
    fn format(&self) -> TextureFormat {
        self.config.format
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn acquire(&mut self) -> Result<TargetFrame, JobError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(TargetFrame {
            view,
            surface: Some(frame),
        })
    }
}
