//! GPU context initialization and management.

use std::sync::Arc;
use wgpu::{Adapter, Backends, Buffer, BufferUsages, Device, Features, Instance, Queue};

use super::buffers;
use super::features::feature_names;
use super::validation::UncapturedErrors;

/// Errors that can occur while opening a GPU context.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No GPU support: none of the requested backends are available on this platform")]
    NoGpuSupport,
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Options used to open a [`GpuContext`].
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub backends: Backends,
    pub power_preference: wgpu::PowerPreference,
    /// Optional features to enable when the adapter supports them.
    pub requested_features: Features,
    pub label: String,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            backends: Backends::PRIMARY | Backends::GL,
            power_preference: wgpu::PowerPreference::HighPerformance,
            requested_features: Features::SHADER_F16,
            label: "wgsl-playground".to_string(),
        }
    }
}

/// GPU context holding the device and queue every job is created against.
///
/// One context is opened per session and passed explicitly to job
/// constructors. Jobs only create resources and submit work through it.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    supported_features: Features,
    errors: UncapturedErrors,
}

impl GpuContext {
    /// Open a context with default options and the given optional features.
    pub async fn new(requested_features: Features) -> Result<Self, GpuError> {
        Self::with_options(&ContextOptions {
            requested_features,
            ..Default::default()
        })
        .await
    }

    /// Blocking variant of [`new`](Self::new) for callers without an executor.
    pub fn new_blocking(requested_features: Features) -> Result<Self, GpuError> {
        pollster::block_on(Self::new(requested_features))
    }

    /// Open a context.
    ///
    /// Requested features the adapter does not report are dropped before the
    /// device is requested. No retry is attempted on failure.
    pub async fn with_options(options: &ContextOptions) -> Result<Self, GpuError> {
        let backends = options.backends & Instance::enabled_backend_features();
        if backends.is_empty() {
            return Err(GpuError::NoGpuSupport);
        }

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let supported_features = adapter.features();
        let required_features = options.requested_features & supported_features;
        let enabled_names = feature_names(required_features);
        let dropped: Vec<&str> = feature_names(options.requested_features)
            .into_iter()
            .filter(|name| !enabled_names.contains(name))
            .collect();
        if !dropped.is_empty() {
            log::warn!("Adapter does not support requested features: {}", dropped.join(", "));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(&options.label),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;
        let errors = UncapturedErrors::install(&device);

        let info = adapter.get_info();
        log::info!(
            "GPU context ready: {} ({:?}), features [{}]",
            info.name,
            info.backend,
            enabled_names.join(", ")
        );

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
            supported_features,
            errors,
        })
    }

    /// Sink for validation errors raised outside an error scope.
    pub(crate) fn uncaptured_errors(&self) -> UncapturedErrors {
        self.errors.clone()
    }

    /// Features the adapter reports as supported.
    pub fn supported_features(&self) -> Features {
        self.supported_features
    }

    /// Features actually enabled on the device.
    pub fn enabled_features(&self) -> Features {
        self.device.features()
    }

    /// Get info about the GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Allocate a buffer on this context's device.
    ///
    /// See [`buffers::create_buffer`].
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

    #[tokio::test]
    async fn test_gpu_context_creation() {
        let ctx = GpuContext::new(Features::empty()).await;
        // May fail on CI without GPU, so just check it doesn't panic
        if let Ok(ctx) = ctx {
            let info = ctx.adapter_info();
            assert!(!info.name.is_empty());
        }
    }

    #[tokio::test]
    async fn test_enabled_features_are_supported() {
        let ctx = match GpuContext::new(Features::SHADER_F16 | Features::TIMESTAMP_QUERY).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let requested = Features::SHADER_F16 | Features::TIMESTAMP_QUERY;
        let enabled = ctx.enabled_features() & requested;
        assert_eq!(enabled, requested & ctx.supported_features());
    }

    #[tokio::test]
    async fn test_empty_backends_is_no_gpu_support() {
        let options = ContextOptions {
            backends: Backends::empty(),
            ..Default::default()
        };
        let result = GpuContext::with_options(&options).await;
        assert!(matches!(result, Err(GpuError::NoGpuSupport)));
    }
}
