//! GPU plumbing on top of wgpu.
//!
//! A [`GpuContext`] is opened once and passed to every job. [`ComputeJob`]
//! runs a WGSL compute shader against bound buffers and textures;
//! [`RenderJob`] draws a WGSL fragment shader over a full-screen triangle
//! into a [`RenderTarget`].

pub mod bindings;
pub mod buffers;
pub mod compute;
pub mod context;
pub mod features;
pub mod render;
pub mod textures;

mod error;
mod validation;

pub use bindings::{Binding, BindingResource, JobBindGroup};
pub use buffers::{align, align4, create_buffer, write_buffer};
pub use compute::{ComputeJob, DispatchDims, DEFAULT_COMPUTE_ENTRY};
pub use context::{ContextOptions, GpuContext, GpuError};
pub use error::JobError;
pub use render::{OffscreenTarget, RenderJob, RenderTarget, SurfaceTarget, DEFAULT_FRAGMENT_ENTRY};
pub use textures::GpuTexture;
