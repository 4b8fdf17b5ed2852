//! Playground configuration loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wgpu::{Backends, Features, PowerPreference};

use crate::gpu::features::parse_feature;
use crate::gpu::{ContextOptions, GpuContext, GpuError, DEFAULT_COMPUTE_ENTRY, DEFAULT_FRAGMENT_ENTRY};
use crate::playground::parse_hex_color;

/// Errors raised while loading or applying a [`PlaygroundConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unknown feature name: {0}")]
    UnknownFeature(String),
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
    #[error("Unknown power preference: {0}")]
    UnknownPowerPreference(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

/// Session settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlaygroundConfig {
    /// Backend names; empty means the platform's primary backends plus GL.
    pub backends: Vec<String>,
    pub power_preference: String,
    /// WebGPU feature names such as `shader-f16`.
    pub requested_features: Vec<String>,
    pub compute_entry_point: String,
    pub fragment_entry_point: String,
    /// `#rrggbb` or `#rrggbbaa`.
    pub clear_color: String,
    pub label: String,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
            power_preference: "high-performance".to_string(),
            requested_features: vec!["shader-f16".to_string()],
            compute_entry_point: DEFAULT_COMPUTE_ENTRY.to_string(),
            fragment_entry_point: DEFAULT_FRAGMENT_ENTRY.to_string(),
            clear_color: "#000000".to_string(),
            label: "wgsl-playground".to_string(),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn backends(&self) -> Result<Backends, ConfigError> {
        if self.backends.is_empty() {
            return Ok(Backends::PRIMARY | Backends::GL);
        }
        self.backends.iter().try_fold(Backends::empty(), |acc, name| {
            let backend = match name.trim().to_ascii_lowercase().as_str() {
                "vulkan" => Backends::VULKAN,
                "metal" => Backends::METAL,
                "dx12" => Backends::DX12,
                "gl" => Backends::GL,
                "browser-webgpu" => Backends::BROWSER_WEBGPU,
                _ => return Err(ConfigError::UnknownBackend(name.clone())),
            };
            Ok(acc | backend)
        })
    }

    pub fn power_preference(&self) -> Result<PowerPreference, ConfigError> {
        match self.power_preference.trim().to_ascii_lowercase().as_str() {
            "high-performance" => Ok(PowerPreference::HighPerformance),
            "low-power" => Ok(PowerPreference::LowPower),
            "none" => Ok(PowerPreference::None),
            _ => Err(ConfigError::UnknownPowerPreference(self.power_preference.clone())),
        }
    }

    pub fn requested_features(&self) -> Result<Features, ConfigError> {
        self.requested_features.iter().try_fold(Features::empty(), |acc, name| {
            parse_feature(name)
                .map(|feature| acc | feature)
                .ok_or_else(|| ConfigError::UnknownFeature(name.clone()))
        })
    }

    pub fn clear_color(&self) -> Result<wgpu::Color, ConfigError> {
        parse_hex_color(&self.clear_color).ok_or_else(|| ConfigError::InvalidColor(self.clear_color.clone()))
    }

    pub fn context_options(&self) -> Result<ContextOptions, ConfigError> {
        Ok(ContextOptions {
            backends: self.backends()?,
            power_preference: self.power_preference()?,
            requested_features: self.requested_features()?,
            label: self.label.clone(),
        })
    }
}

impl GpuContext {
    /// Open a context from a loaded config.
    pub async fn initialize(config: &PlaygroundConfig) -> Result<Self, ConfigError> {
        let options = config.context_options()?;
        Ok(Self::with_options(&options).await?)
    }
}
