//! Compute job: compile, build, bind, dispatch, read back.

use std::sync::Arc;
use wgpu::{Buffer, BufferUsages, ComputePipeline, Device, Queue, ShaderModule};

use super::dispatch::DispatchDims;
use super::readback::{cast_bytes, read_buffer};
use crate::gpu::bindings::{self, Binding, JobBindGroup};
use crate::gpu::validation::{self, UncapturedErrors};
use crate::gpu::{buffers, GpuContext, JobError};

/// Default compute entry point.
pub const DEFAULT_COMPUTE_ENTRY: &str = "main";

/// A compute shader with at most one pipeline built from it.
///
/// The shader module is compiled on the first [`build`](Self::build) and
/// reused by later builds, so rebuilding unchanged source yields an
/// equivalent pipeline. Every build bumps the pipeline generation, which
/// invalidates bind groups created for the previous pipeline.
pub struct ComputeJob {
    device: Arc<Device>,
    queue: Arc<Queue>,
    errors: UncapturedErrors,
    source: String,
    entry_point: String,
    module: Option<ShaderModule>,
    pipeline: Option<ComputePipeline>,
    generation: u64,
}

impl ComputeJob {
    /// Create a job for `source` using the `main` entry point.
    pub fn new(ctx: &GpuContext, source: impl Into<String>) -> Self {
        Self::with_entry_point(ctx, source, DEFAULT_COMPUTE_ENTRY)
    }

    pub fn with_entry_point(
        ctx: &GpuContext,
        source: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            errors: ctx.uncaptured_errors(),
            source: source.into(),
            entry_point: entry_point.into(),
            module: None,
            pipeline: None,
            generation: 0,
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_built(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Generation of the current pipeline; 0 before the first successful build.
    pub fn pipeline_generation(&self) -> u64 {
        self.generation
    }

    /// Compile the pipeline.
    ///
    /// Shader compile and pipeline validation errors are returned as-is. A
    /// failed build leaves the job without a pipeline.
    pub async fn build(&mut self) -> Result<(), JobError> {
        self.pipeline = None;

        if self.module.is_none() {
            let module = validation::compile_wgsl(&self.device, "compute_shader", &self.source).await?;
            self.module = Some(module);
        }
        let Some(module) = self.module.as_ref() else {
            return Err(JobError::PipelineNotReady);
        };

        let (pipeline, error) = validation::capture(&self.device, || {
            self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("compute_pipeline"),
                layout: None,
                module,
                entry_point: Some(&self.entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        })
        .await;
        if let Some(err) = error {
            return Err(JobError::Validation(err.to_string()));
        }

        self.generation += 1;
        self.pipeline = Some(pipeline);
        log::info!(
            "Compute pipeline built (entry '{}', generation {})",
            self.entry_point,
            self.generation
        );
        Ok(())
    }

    /// The current pipeline.
    pub fn pipeline(&self) -> Result<&ComputePipeline, JobError> {
        self.pipeline.as_ref().ok_or(JobError::PipelineNotReady)
    }

    /// Create a bind group against layout 0 of the current pipeline.
    pub async fn bind(&self, bindings: &[Binding<'_>]) -> Result<JobBindGroup, JobError> {
        let pipeline = self.pipeline()?;
        bindings::create_bind_group(
            &self.device,
            "compute_bind_group",
            || pipeline.get_bind_group_layout(0),
            bindings,
            self.generation,
        )
        .await
    }

    /// Submit one compute pass. Does not wait for the GPU.
    ///
    /// Grids larger than the device's per-dimension workgroup limit are
    /// rejected before encoding. Validation errors raised by the pass are
    /// returned as [`JobError::Validation`].
    pub fn dispatch(
        &self,
        bind_group: &JobBindGroup,
        dims: impl Into<DispatchDims>,
    ) -> Result<(), JobError> {
        let pipeline = self.pipeline()?;
        let group = bind_group.check(self.generation)?;
        let (x, y, z) = dims.into().resolved();
        let max = self.device.limits().max_compute_workgroups_per_dimension;
        if x > max || y > max || z > max {
            return Err(JobError::DispatchTooLarge { x, y, z, max });
        }

        self.errors.clear();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compute_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.queue.submit(Some(encoder.finish()));
        self.errors.check()?;
        log::debug!("Dispatched {}x{}x{} workgroups", x, y, z);
        Ok(())
    }

    /// Read `byte_len` bytes (default: all) of `buffer` back to the host.
    pub async fn readback(&self, buffer: &Buffer, byte_len: Option<u64>) -> Result<Vec<u8>, JobError> {
        self.errors.clear();
        let bytes = read_buffer(&self.device, &self.queue, buffer, byte_len).await?;
        self.errors.check()?;
        Ok(bytes)
    }

    /// Read `buffer` back as a vector of `T`.
    pub async fn readback_as<T: bytemuck::Pod>(
        &self,
        buffer: &Buffer,
        count: Option<usize>,
    ) -> Result<Vec<T>, JobError> {
        let byte_len = count.map(|n| (n * std::mem::size_of::<T>()) as u64);
        let bytes = self.readback(buffer, byte_len).await?;
        Ok(cast_bytes(&bytes))
    }

    /// Allocate a buffer on this job's device.
    pub fn make_buffer(
        &self,
        label: &str,
        size: u64,
        usage: BufferUsages,
        initial_data: Option<&[u8]>,
    ) -> Buffer {
        buffers::create_buffer(&self.device, label, size, usage, initial_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::Features;

    const SQUARES: &str = r#"
@group(0) @binding(0) var<storage, read_write> out: array<u32>;
@compute @workgroup_size(4)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i < arrayLength(&out)) { out[i] = i * i; }
}
"#;

    async fn test_context() -> Option<GpuContext> {
        GpuContext::new(Features::empty()).await.ok()
    }

    #[tokio::test]
    async fn test_bind_before_build_fails() {
        let Some(ctx) = test_context().await else { return };
        let job = ComputeJob::new(&ctx, SQUARES);
        let out = job.make_buffer("out", 64, BufferUsages::STORAGE, None);

        let result = job.bind(&[Binding::buffer(&out)]).await;
        assert!(matches!(result, Err(JobError::PipelineNotReady)));
        assert!(matches!(job.pipeline(), Err(JobError::PipelineNotReady)));
    }

    #[tokio::test]
    async fn test_build_bumps_generation() {
        let Some(ctx) = test_context().await else { return };
        let mut job = ComputeJob::new(&ctx, SQUARES);
        assert_eq!(job.pipeline_generation(), 0);

        job.build().await.unwrap();
        assert!(job.is_built());
        assert_eq!(job.pipeline_generation(), 1);

        job.build().await.unwrap();
        assert_eq!(job.pipeline_generation(), 2);
    }

    #[tokio::test]
    async fn test_stale_bind_group_rejected() {
        let Some(ctx) = test_context().await else { return };
        let mut job = ComputeJob::new(&ctx, SQUARES);
        let out = job.make_buffer("out", 64, BufferUsages::STORAGE, None);

        job.build().await.unwrap();
        let group = job.bind(&[Binding::buffer(&out)]).await.unwrap();
        job.build().await.unwrap();

        let result = job.dispatch(&group, 4u32);
        assert!(matches!(
            result,
            Err(JobError::StaleBindGroup {
                built_for: 1,
                current: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_oversized_dispatch_is_rejected() {
        let Some(ctx) = test_context().await else { return };
        let mut job = ComputeJob::new(&ctx, SQUARES);
        let out = job.make_buffer("out", 64, BufferUsages::STORAGE, None);
        job.build().await.unwrap();
        let group = job.bind(&[Binding::buffer(&out)]).await.unwrap();

        let max = ctx.device.limits().max_compute_workgroups_per_dimension;
        let result = job.dispatch(&group, (1u32, max + 1));
        assert!(matches!(result, Err(JobError::DispatchTooLarge { x: 1, .. })));
        assert!(job.dispatch(&group, 1u32).is_ok());
    }

    #[tokio::test]
    async fn test_malformed_shader_fails_build() {
        let Some(ctx) = test_context().await else { return };
        let mut job = ComputeJob::new(&ctx, "@compute fn main( {");

        let result = job.build().await;
        assert!(matches!(result, Err(JobError::ShaderCompile(_))));
        assert!(!job.is_built());
    }

    #[tokio::test]
    async fn test_missing_entry_point_fails_build() {
        let Some(ctx) = test_context().await else { return };
        let mut job = ComputeJob::with_entry_point(&ctx, SQUARES, "not_there");

        let result = job.build().await;
        assert!(matches!(result, Err(JobError::Validation(_))));
        assert!(!job.is_built());
    }
}
