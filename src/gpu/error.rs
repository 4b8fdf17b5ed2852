//! Errors raised by compute and render jobs.

/// Errors that can occur while building, binding, running, or reading back a job.
///
/// `PipelineNotReady` and `NoFragmentSet` are precondition failures: the job
/// is left untouched and the call can be retried once the precondition holds.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Pipeline not built yet")]
    PipelineNotReady,
    #[error("No fragment shader set")]
    NoFragmentSet,
    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("GPU validation failed: {0}")]
    Validation(String),
    #[error("Bind group was built for pipeline generation {built_for}, current is {current}")]
    StaleBindGroup { built_for: u64, current: u64 },
    #[error("GPU buffer mapping failed: {0}")]
    BufferMap(String),
    #[error("Readback of {requested} bytes exceeds buffer size {available}")]
    ReadbackOutOfRange { requested: u64, available: u64 },
    #[error(
        "Readback of {requested} bytes needs a copy of {copy_len} bytes (4-byte aligned), \
         but the buffer holds only {available}"
    )]
    UnalignedReadback {
        requested: u64,
        copy_len: u64,
        available: u64,
    },
    #[error("Buffer lacks COPY_SRC usage and cannot be read back")]
    NotCopySource,
    #[error("Dispatch of {x}x{y}x{z} workgroups exceeds the per-dimension limit {max}")]
    DispatchTooLarge { x: u32, y: u32, z: u32, max: u32 },
    #[error("Texture format {0:?} cannot be read back as whole pixels")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("Surface is not supported by the adapter")]
    UnsupportedSurface,
    #[error("Failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
