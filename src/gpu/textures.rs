//! Texture management for offscreen targets and compute outputs.

use wgpu::{Device, Queue, Texture, TextureFormat, TextureUsages, TextureView};

use super::compute::map_read;
use super::JobError;

/// A 2D texture and the view used to bind it.
pub struct GpuTexture {
    texture: Texture,
    view: TextureView,
}

impl GpuTexture {
    /// Create a new 2D texture with the specified usage flags.
    pub fn new(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Create a texture a compute shader writes and a fragment shader samples.
    pub fn for_storage(device: &Device, label: &str, width: u32, height: u32) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            TextureFormat::Rgba8Unorm,
            TextureUsages::STORAGE_BINDING | TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_SRC,
        )
    }

    /// Create a render target whose pixels can be copied to the CPU.
    pub fn for_output(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            format,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC | TextureUsages::TEXTURE_BINDING,
        )
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Copy the texture to the host as tightly packed pixels, rows top to
    /// bottom, [`pixel_size`] bytes each.
    pub async fn read_pixels(&self, device: &Device, queue: &Queue) -> Result<Vec<u8>, JobError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("texture_readback_encoder"),
        });
        let pending = PendingPixels::record(device, &mut encoder, &self.texture)?;
        queue.submit(Some(encoder.finish()));
        pending.collect(device).await
    }
}

/// Bytes per pixel of `format` in a texture-to-buffer copy.
///
/// Block-compressed formats and formats without a single copyable aspect
/// (depth-stencil, planar) cannot be read back pixel by pixel.
pub fn pixel_size(format: TextureFormat) -> Result<u32, JobError> {
    if format.block_dimensions() != (1, 1) {
        return Err(JobError::UnsupportedFormat(format));
    }
    format
        .block_copy_size(None)
        .ok_or(JobError::UnsupportedFormat(format))
}

/// Row pitch of a texture copy.
///
/// Buffer rows of a texture copy must start on
/// `COPY_BYTES_PER_ROW_ALIGNMENT` boundaries, so each copied row carries
/// padding past the pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPitch {
    pub pixel_bytes: u32,
    pub padded_bytes: u32,
}

impl RowPitch {
    pub fn new(width: u32, bytes_per_pixel: u32) -> Self {
        let pixel_bytes = width * bytes_per_pixel;
        let padded_bytes = pixel_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        Self {
            pixel_bytes,
            padded_bytes,
        }
    }

    /// Drop the per-row padding from a padded copy.
    pub fn unpad(&self, padded: &[u8]) -> Vec<u8> {
        padded
            .chunks_exact(self.padded_bytes as usize)
            .flat_map(|row| &row[..self.pixel_bytes as usize])
            .copied()
            .collect()
    }
}

/// A texture-to-buffer copy recorded on an encoder and not yet read.
struct PendingPixels {
    staging: wgpu::Buffer,
    pitch: RowPitch,
}

impl PendingPixels {
    fn record(
        device: &Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &Texture,
    ) -> Result<Self, JobError> {
        let size = texture.size();
        let pitch = RowPitch::new(size.width, pixel_size(texture.format())?);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixel_staging"),
            size: pitch.padded_bytes as u64 * size.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(pitch.padded_bytes),
                    rows_per_image: Some(size.height),
                },
            },
            size,
        );
        Ok(Self { staging, pitch })
    }

    async fn collect(self, device: &Device) -> Result<Vec<u8>, JobError> {
        let padded = map_read(device, &self.staging, self.staging.size()).await;
        self.staging.destroy();
        Ok(self.pitch.unpad(&padded?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[test]
    fn test_row_pitch() {
        let pitch = RowPitch::new(10, 4);
        assert_eq!(pitch.pixel_bytes, 40);
        assert_eq!(pitch.padded_bytes, 256);
        assert_eq!(RowPitch::new(64, 4).padded_bytes, 256);
        assert_eq!(RowPitch::new(65, 4).padded_bytes, 512);
        assert_eq!(RowPitch::new(8, 8).pixel_bytes, 64);
    }

    #[test]
    fn test_pixel_size_by_format() {
        assert_eq!(pixel_size(TextureFormat::Rgba8Unorm).unwrap(), 4);
        assert_eq!(pixel_size(TextureFormat::Bgra8UnormSrgb).unwrap(), 4);
        assert_eq!(pixel_size(TextureFormat::Rgba16Float).unwrap(), 8);
        assert_eq!(pixel_size(TextureFormat::R8Unorm).unwrap(), 1);
        assert!(matches!(
            pixel_size(TextureFormat::Bc1RgbaUnorm),
            Err(JobError::UnsupportedFormat(TextureFormat::Bc1RgbaUnorm))
        ));
        assert!(matches!(
            pixel_size(TextureFormat::Depth24PlusStencil8),
            Err(JobError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_unpad_drops_padding() {
        let pitch = RowPitch {
            pixel_bytes: 4,
            padded_bytes: 8,
        };
        let padded = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        assert_eq!(pitch.unpad(&padded), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn test_storage_texture_usage() {
        let ctx = match GpuContext::new(wgpu::Features::empty()).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let tex = GpuTexture::for_storage(&ctx.device, "storage", 24, 12);
        assert_eq!((tex.width(), tex.height()), (24, 12));
        assert!(tex.texture().usage().contains(TextureUsages::STORAGE_BINDING));

        let pixels = tex.read_pixels(&ctx.device, &ctx.queue).await.unwrap();
        assert_eq!(pixels.len(), 24 * 12 * 4);
    }
}
