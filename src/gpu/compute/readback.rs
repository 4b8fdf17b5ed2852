//! Copy device buffers back to host memory through a staging buffer.

use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::gpu::buffers::align4;
use crate::gpu::JobError;

/// Read `byte_len` bytes (default: the whole buffer) from `src`.
///
/// `src` needs `COPY_SRC` usage. The copy is submitted before the staging
/// buffer is mapped, so the queue has retired it by the time the map
/// completes.
pub async fn read_buffer(
    device: &Device,
    queue: &Queue,
    src: &Buffer,
    byte_len: Option<u64>,
) -> Result<Vec<u8>, JobError> {
    if !src.usage().contains(BufferUsages::COPY_SRC) {
        return Err(JobError::NotCopySource);
    }
    let available = src.size();
    let requested = byte_len.unwrap_or(available);
    if requested > available {
        return Err(JobError::ReadbackOutOfRange {
            requested,
            available,
        });
    }
    let copy_len = align4(requested);
    if copy_len > available {
        return Err(JobError::UnalignedReadback {
            requested,
            copy_len,
            available,
        });
    }
    if requested == 0 {
        return Ok(Vec::new());
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: copy_len,
        usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, copy_len);
    queue.submit(Some(encoder.finish()));
    log::debug!("Reading back {} bytes ({} copied)", requested, copy_len);

    let bytes = map_read(device, &staging, requested).await;
    staging.destroy();
    bytes
}

/// Map a `MAP_READ` buffer and copy out its first `len` bytes.
///
/// The map callback is awaited through a oneshot channel. Native targets
/// drive the device until the map resolves; on the web the browser does.
pub(crate) async fn map_read(device: &Device, buffer: &Buffer, len: u64) -> Result<Vec<u8>, JobError> {
    let slice = buffer.slice(..);

    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        sender.send(result).ok();
    });

    #[cfg(not(target_arch = "wasm32"))]
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| JobError::BufferMap(e.to_string()))?;
    #[cfg(target_arch = "wasm32")]
    let _ = device.poll(wgpu::PollType::Poll);

    match receiver.receive().await {
        Some(Ok(())) => {}
        Some(Err(err)) => return Err(JobError::BufferMap(err.to_string())),
        None => return Err(JobError::BufferMap("map callback dropped".to_string())),
    }

    let data = slice.get_mapped_range();
    let result = data[..len as usize].to_vec();
    drop(data);
    buffer.unmap();

    Ok(result)
}

/// Reinterpret read-back bytes as a slice of `T`, ignoring any trailing remainder.
pub fn cast_bytes<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}
