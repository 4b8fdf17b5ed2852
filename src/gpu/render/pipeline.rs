//! Render pipeline for a fragment shader over the full-screen triangle.

use wgpu::{Device, RenderPipeline, ShaderModule, TextureFormat};

/// Vertex stage shared by every render job.
pub const FULLSCREEN_VERTEX_WGSL: &str = include_str!("../shaders/fullscreen.wgsl");

/// Entry point of [`FULLSCREEN_VERTEX_WGSL`].
pub const FULLSCREEN_VERTEX_ENTRY: &str = "vmain";

/// The two shader stages and the color format a render pipeline targets.
///
/// The layout is inferred from the shaders, no vertex buffers are bound,
/// and the single color target is written without blending.
pub struct FullscreenStages<'a> {
    pub vertex: &'a ShaderModule,
    pub fragment: &'a ShaderModule,
    pub fragment_entry: &'a str,
    pub format: TextureFormat,
}

impl FullscreenStages<'_> {
    pub fn create_pipeline(&self, device: &Device, label: &str) -> RenderPipeline {
        let targets = [Some(wgpu::ColorTargetState {
            format: self.format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: None,
            vertex: wgpu::VertexState {
                module: self.vertex,
                entry_point: Some(FULLSCREEN_VERTEX_ENTRY),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: self.fragment,
                entry_point: Some(self.fragment_entry),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}
