//! Resource bindings for job bind groups.
//!
//! Jobs use automatic pipeline layouts, so a bind group is only valid for
//! the pipeline whose layout it was created from. [`JobBindGroup`] records
//! that pipeline's generation so a rebuild can be detected instead of
//! producing a layout mismatch on the device.

use wgpu::{BindGroup, BindGroupEntry, BindGroupLayout, Buffer, Device, Sampler, TextureView};

use super::{validation, JobError};

/// A resource to place in a bind group slot.
#[derive(Debug, Clone, Copy)]
pub enum BindingResource<'a> {
    /// Uniform or storage buffer, bound in full.
    Buffer(&'a Buffer),
    /// Sampled texture.
    Texture(&'a TextureView),
    /// Storage texture (`texture_storage_2d`).
    StorageTexture(&'a TextureView),
    Sampler(&'a Sampler),
}

/// A resource with an optional explicit binding index.
///
/// Without an index the binding takes its position in the list.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub index: Option<u32>,
    pub resource: BindingResource<'a>,
}

impl<'a> Binding<'a> {
    pub fn buffer(buffer: &'a Buffer) -> Self {
        Self::positional(BindingResource::Buffer(buffer))
    }

    pub fn texture(view: &'a TextureView) -> Self {
        Self::positional(BindingResource::Texture(view))
    }

    pub fn storage_texture(view: &'a TextureView) -> Self {
        Self::positional(BindingResource::StorageTexture(view))
    }

    pub fn sampler(sampler: &'a Sampler) -> Self {
        Self::positional(BindingResource::Sampler(sampler))
    }

    /// Pin this binding to an explicit slot.
    pub fn at(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    fn positional(resource: BindingResource<'a>) -> Self {
        Self {
            index: None,
            resource,
        }
    }
}

/// Resolve bindings to bind group entries.
pub fn resolve_entries<'a>(bindings: &[Binding<'a>]) -> Vec<BindGroupEntry<'a>> {
    bindings
        .iter()
        .enumerate()
        .map(|(position, b)| BindGroupEntry {
            binding: b.index.unwrap_or(position as u32),
            resource: match b.resource {
                BindingResource::Buffer(buffer) => buffer.as_entire_binding(),
                BindingResource::Texture(view) | BindingResource::StorageTexture(view) => {
                    wgpu::BindingResource::TextureView(view)
                }
                BindingResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
            },
        })
        .collect()
}

/// A bind group tied to the pipeline generation it was created against.
#[derive(Debug)]
pub struct JobBindGroup {
    group: BindGroup,
    generation: u64,
}

impl JobBindGroup {
    pub(crate) fn new(group: BindGroup, generation: u64) -> Self {
        Self { group, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn raw(&self) -> &BindGroup {
        &self.group
    }

    /// Check that this group was built against pipeline generation `current`.
    pub fn check(&self, current: u64) -> Result<&BindGroup, JobError> {
        if self.generation != current {
            return Err(JobError::StaleBindGroup {
                built_for: self.generation,
                current,
            });
        }
        Ok(&self.group)
    }
}

/// Create a bind group for group 0 of a pipeline's inferred layout.
pub(crate) async fn create_bind_group(
    device: &Device,
    label: &str,
    layout: impl FnOnce() -> BindGroupLayout,
    bindings: &[Binding<'_>],
    generation: u64,
) -> Result<JobBindGroup, JobError> {
    let entries = resolve_entries(bindings);
    let (group, error) = validation::capture(device, || {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout(),
            entries: &entries,
        })
    })
    .await;

    if let Some(err) = error {
        return Err(JobError::Validation(err.to_string()));
    }
    log::debug!("{}: bound {} resources (generation {})", label, entries.len(), generation);
    Ok(JobBindGroup::new(group, generation))
}
