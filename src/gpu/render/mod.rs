//! Render jobs over a fixed full-screen triangle.

mod job;
mod pipeline;
mod targets;

pub use job::{RenderJob, DEFAULT_FRAGMENT_ENTRY};
pub use pipeline::{FullscreenStages, FULLSCREEN_VERTEX_ENTRY, FULLSCREEN_VERTEX_WGSL};
pub use targets::{OffscreenTarget, RenderTarget, SurfaceTarget, TargetFrame};
