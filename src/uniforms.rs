//! Per-frame uniforms for fragment shaders.
//!
//! These structs must match the WGSL definitions exactly:
//!
//! ```wgsl
//! struct Uniforms { time: vec4<f32>, res: vec4<f32>, };
//! @group(0) @binding(0) var<uniform> U: Uniforms;
//! ```

/// Time, pointer position, and resolution, packed as two `vec4<f32>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// x: seconds since start, y/z: pointer position in pixels.
    pub time: [f32; 4],
    /// x/y: target size in pixels.
    pub res: [f32; 4],
}

impl FrameUniforms {
    pub fn new(seconds: f32, pointer: [f32; 2], size: (u32, u32)) -> Self {
        Self {
            time: [seconds, pointer[0], pointer[1], 0.0],
            res: [size.0 as f32, size.1 as f32, 0.0, 0.0],
        }
    }

    pub fn seconds(&self) -> f32 {
        self.time[0]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Size of [`FrameUniforms`] in bytes.
pub const FRAME_UNIFORMS_SIZE: u64 = std::mem::size_of::<FrameUniforms>() as u64;
