//! Render job: a fragment shader drawn over the full-screen triangle.

use std::sync::Arc;
use wgpu::{Device, Queue, RenderPipeline, ShaderModule};

use super::pipeline::{FullscreenStages, FULLSCREEN_VERTEX_WGSL};
use super::targets::RenderTarget;
use crate::gpu::bindings::{self, Binding, JobBindGroup};
use crate::gpu::validation::{self, UncapturedErrors};
use crate::gpu::{GpuContext, JobError};

/// Default fragment entry point.
pub const DEFAULT_FRAGMENT_ENTRY: &str = "fmain";

/// A fragment shader rendered into a [`RenderTarget`], one draw per frame.
///
/// The fragment stage receives `@location(0) uv: vec2<f32>` in `[0, 1]`.
/// Replacing the fragment source drops the pipeline and bind group; the
/// next frame needs a fresh [`build`](Self::build).
pub struct RenderJob<T: RenderTarget> {
    device: Arc<Device>,
    queue: Arc<Queue>,
    errors: UncapturedErrors,
    target: T,
    vertex: ShaderModule,
    fragment_entry: String,
    fragment_source: Option<String>,
    fragment: Option<ShaderModule>,
    pipeline: Option<RenderPipeline>,
    bind_group: Option<JobBindGroup>,
    generation: u64,
}

impl<T: RenderTarget> RenderJob<T> {
    /// Create a job drawing into `target` with the `fmain` fragment entry point.
    pub fn new(ctx: &GpuContext, target: T) -> Self {
        Self::with_entry_point(ctx, target, DEFAULT_FRAGMENT_ENTRY)
    }

    pub fn with_entry_point(ctx: &GpuContext, target: T, fragment_entry: impl Into<String>) -> Self {
        let vertex = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fullscreen_vertex"),
            source: wgpu::ShaderSource::Wgsl(FULLSCREEN_VERTEX_WGSL.into()),
        });

        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            errors: ctx.uncaptured_errors(),
            target,
            vertex,
            fragment_entry: fragment_entry.into(),
            fragment_source: None,
            fragment: None,
            pipeline: None,
            bind_group: None,
            generation: 0,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn fragment_source(&self) -> Option<&str> {
        self.fragment_source.as_deref()
    }

    pub fn is_built(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn has_bind_group(&self) -> bool {
        self.bind_group.is_some()
    }

    /// Generation of the current pipeline; 0 before the first successful build.
    pub fn pipeline_generation(&self) -> u64 {
        self.generation
    }

    /// Replace the fragment shader. Clears the pipeline and bind group.
    pub fn set_fragment(&mut self, source: impl Into<String>) {
        self.fragment_source = Some(source.into());
        self.fragment = None;
        self.pipeline = None;
        self.bind_group = None;
    }

    /// Build the render pipeline for the current fragment shader.
    pub async fn build(&mut self) -> Result<(), JobError> {
        let source = self.fragment_source.as_deref().ok_or(JobError::NoFragmentSet)?;
        self.pipeline = None;
        self.bind_group = None;

        if self.fragment.is_none() {
            let module = validation::compile_wgsl(&self.device, "fragment_shader", source).await?;
            self.fragment = Some(module);
        }
        let Some(fragment) = self.fragment.as_ref() else {
            return Err(JobError::NoFragmentSet);
        };

        let stages = FullscreenStages {
            vertex: &self.vertex,
            fragment,
            fragment_entry: &self.fragment_entry,
            format: self.target.format(),
        };
        let (pipeline, error) =
            validation::capture(&self.device, || stages.create_pipeline(&self.device, "render_pipeline")).await;
        if let Some(err) = error {
            return Err(JobError::Validation(err.to_string()));
        }

        self.generation += 1;
        self.pipeline = Some(pipeline);
        log::info!(
            "Render pipeline built (entry '{}', format {:?}, generation {})",
            self.fragment_entry,
            self.target.format(),
            self.generation
        );
        Ok(())
    }

    /// The current pipeline.
    pub fn pipeline(&self) -> Result<&RenderPipeline, JobError> {
        self.pipeline.as_ref().ok_or(JobError::PipelineNotReady)
    }

    /// Bind resources to group 0 of the current pipeline.
    pub async fn bind(&mut self, bindings: &[Binding<'_>]) -> Result<(), JobError> {
        let pipeline = self.pipeline()?;
        let group = bindings::create_bind_group(
            &self.device,
            "render_bind_group",
            || pipeline.get_bind_group_layout(0),
            bindings,
            self.generation,
        )
        .await?;
        self.bind_group = Some(group);
        Ok(())
    }

    /// Build the pipeline if it is missing, then bind.
    pub async fn build_and_bind(&mut self, bindings: &[Binding<'_>]) -> Result<(), JobError> {
        if self.pipeline.is_none() {
            self.build().await?;
        }
        self.bind(bindings).await
    }

    /// Draw one frame: clear (default opaque black), draw 3 vertices, submit.
    ///
    /// Does not wait for the GPU. Surface frames are presented after submit.
    /// A draw the device rejects, such as one missing a bind group the
    /// shader declares, is returned as [`JobError::Validation`] and the
    /// frame is not presented.
    pub fn render_frame(&mut self, clear: Option<wgpu::Color>) -> Result<(), JobError> {
        let pipeline = self.pipeline.as_ref().ok_or(JobError::PipelineNotReady)?;
        let bind_group = match &self.bind_group {
            Some(group) => Some(group.check(self.generation)?),
            None => None,
        };
        let frame = self.target.acquire()?;
        self.errors.clear();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.unwrap_or(wgpu::Color::BLACK)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(pipeline);
            if let Some(group) = bind_group {
                pass.set_bind_group(0, group, &[]);
            }
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        self.errors.check()?;
        frame.present();
        Ok(())
    }
}
