//! Validation error capture for creation calls that consume user WGSL.
//!
//! wgpu reports shader and pipeline validation failures through the device
//! error sink rather than as return values. Every call that can fail on
//! user-supplied source runs inside a validation scope so the failure comes
//! back to the caller as an `Err` instead of reaching the uncaptured-error
//! handler.
//!
//! Submissions (dispatch, copies, draws) cannot await a scope, so the device
//! also gets an uncaptured-error handler that logs and records errors in
//! [`UncapturedErrors`]. Submitting code clears it before encoding and
//! checks it after submit; native wgpu reports these errors synchronously.

use std::sync::{Arc, Mutex};
use wgpu::{Device, ShaderModule};

use super::JobError;

/// Errors that reached a device's uncaptured-error handler.
#[derive(Debug, Clone, Default)]
pub struct UncapturedErrors(Arc<Mutex<Vec<String>>>);

impl UncapturedErrors {
    /// Replace the device's default (panicking) handler with one that
    /// records into the returned sink.
    pub(crate) fn install(device: &Device) -> Self {
        let errors = Self::default();
        let pending = errors.0.clone();
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| {
            log::warn!("Uncaptured GPU error: {}", err);
            let mut pending = pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            pending.push(err.to_string());
        }));
        errors
    }

    fn drain(&self) -> Vec<String> {
        let mut pending = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *pending)
    }

    /// Drop errors left over from earlier, unrelated work.
    pub(crate) fn clear(&self) {
        let stale = self.drain();
        if !stale.is_empty() {
            log::debug!("Discarding {} earlier uncaptured errors", stale.len());
        }
    }

    /// Fail with every error recorded since the last [`clear`](Self::clear).
    pub(crate) fn check(&self) -> Result<(), JobError> {
        let errors = self.drain();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(JobError::Validation(errors.join("\n")))
        }
    }
}

/// Run `create` inside a validation error scope and return its value with
/// whatever error the scope captured.
pub(crate) async fn capture<T>(device: &Device, create: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let error = scope.pop().await;
    (value, error)
}

/// Compile WGSL source into a shader module.
///
/// The compiler message is passed through verbatim on failure.
pub(crate) async fn compile_wgsl(
    device: &Device,
    label: &str,
    source: &str,
) -> Result<ShaderModule, JobError> {
    let (module, error) = capture(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
    .await;

    match error {
        Some(err) => {
            log::debug!("{} failed to compile: {}", label, err);
            Err(JobError::ShaderCompile(err.to_string()))
        }
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[tokio::test]
    async fn test_uncaptured_error_is_recorded_not_raised() {
        let ctx = match GpuContext::new(wgpu::Features::empty()).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let errors = ctx.uncaptured_errors();
        errors.clear();
        // Mapping a buffer for read without MAP_READ usage is a validation error.
        let _ = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bad"),
            size: 4,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        assert!(matches!(errors.check(), Err(JobError::Validation(msg)) if !msg.is_empty()));
        assert!(errors.check().is_ok());
    }

    #[tokio::test]
    async fn test_compile_valid_wgsl() {
        let ctx = match GpuContext::new(wgpu::Features::empty()).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let source = "@compute @workgroup_size(1) fn main() {}";
        assert!(compile_wgsl(&ctx.device, "valid", source).await.is_ok());
    }

    #[tokio::test]
    async fn test_compile_malformed_wgsl() {
        let ctx = match GpuContext::new(wgpu::Features::empty()).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let result = compile_wgsl(&ctx.device, "broken", "fn main( {").await;
        match result {
            Err(JobError::ShaderCompile(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected shader compile failure, got {:?}", other.map(|_| ())),
        }
    }
}
