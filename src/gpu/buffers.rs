//! GPU buffer allocation.

use wgpu::{Buffer, BufferUsages, Device, Queue};

/// Alignment required by buffer copies and mapping.
pub const BUFFER_ALIGNMENT: u64 = wgpu::COPY_BUFFER_ALIGNMENT;

/// Round `n` up to the next multiple of `to`. An alignment of 0 leaves `n`
/// unchanged.
pub fn align(n: u64, to: u64) -> u64 {
    if to == 0 {
        return n;
    }
    n.div_ceil(to) * to
}

/// Round `n` up to the next multiple of 4.
pub fn align4(n: u64) -> u64 {
    align(n, BUFFER_ALIGNMENT)
}

/// Allocate a buffer of at least `size` bytes, rounded up to 4.
///
/// With `initial_data` the buffer is created mapped, filled, and unmapped
/// before it is returned, so it is populated before any device access. The
/// allocation grows to hold the data if `size` is smaller than it.
pub fn create_buffer(
    device: &Device,
    label: &str,
    size: u64,
    usage: BufferUsages,
    initial_data: Option<&[u8]>,
) -> Buffer {
    let requested = match initial_data {
        Some(data) => size.max(data.len() as u64),
        None => size,
    };
    let aligned = align4(requested);
    log::debug!("Allocating buffer {} ({} -> {} bytes, {:?})", label, size, aligned, usage);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: aligned,
        usage,
        mapped_at_creation: initial_data.is_some(),
    });

    if let Some(data) = initial_data {
        {
            let mut mapped = buffer.slice(..).get_mapped_range_mut();
            mapped[..data.len()].copy_from_slice(data);
        }
        buffer.unmap();
    }

    buffer
}

/// Write `bytes` into a `COPY_DST` buffer at `offset`.
///
/// The write is staged on the queue and lands before the next submission.
pub fn write_buffer(queue: &Queue, buffer: &Buffer, offset: u64, bytes: &[u8]) {
    queue.write_buffer(buffer, offset, bytes);
}
