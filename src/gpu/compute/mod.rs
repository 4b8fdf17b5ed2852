//! Compute jobs.
//!
//! A [`ComputeJob`] wraps one WGSL compute shader: build its pipeline, bind
//! buffers and textures to group 0, dispatch a workgroup grid, and read
//! result buffers back to the host.

mod dispatch;
mod job;
mod readback;

pub use dispatch::DispatchDims;
pub use job::{ComputeJob, DEFAULT_COMPUTE_ENTRY};
pub use readback::{cast_bytes, read_buffer};

pub(crate) use readback::map_read;
