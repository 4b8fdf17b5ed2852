//! WGSL Playground
//!
//! Run WGSL compute and fragment shaders against a wgpu device and inspect
//! what they produce.
//!
//! # Features
//!
//! - Device context with optional feature negotiation
//! - Buffer allocation with 4-byte alignment and optional initial data
//! - Compute jobs: build, bind, dispatch, and read back
//! - Render jobs: a fragment shader over a full-screen triangle, drawn to a
//!   window surface or an offscreen texture
//! - An animation loop feeding time, pointer, and resolution uniforms
//! - JSON configuration and ready-made WGSL presets

pub mod config;
pub mod gpu;
pub mod playground;
pub mod presenter;
pub mod presets;
pub mod uniforms;

// Re-export commonly used types
pub use config::{ConfigError, PlaygroundConfig};
pub use gpu::{
    align4, create_buffer, Binding, ComputeJob, ContextOptions, DispatchDims, GpuContext, GpuError,
    JobBindGroup, JobError, OffscreenTarget, RenderJob, RenderTarget, SurfaceTarget,
};
pub use playground::{
    parse_hex_color, render_preview, run_compute, run_texture_pipeline, write_image,
    ComputeReport, ComputeRequest, PlaygroundError, RenderRequest, TextureRequest,
};
pub use presenter::{AnimationLoop, StopHandle};
pub use uniforms::FrameUniforms;
