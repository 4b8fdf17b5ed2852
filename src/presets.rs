//! Ready-made WGSL programs.
//!
//! Fragment presets use the `fmain` entry point and, when animated, read
//! [`FrameUniforms`](crate::uniforms::FrameUniforms) as `U` at group 0
//! binding 0. Compute presets use `main`.

/// `out[i] = i * i` for `i < params.n`; params at binding 0, output at binding 1.
pub const SQUARES_COMPUTE: &str = include_str!("gpu/shaders/squares.wgsl");

/// Workgroup size declared by [`SQUARES_COMPUTE`].
pub const SQUARES_WORKGROUP_SIZE: u32 = 64;

/// Checkerboard of 32px cells written to an rgba8unorm storage texture at binding 0.
pub const CHECKER_TEXTURE_COMPUTE: &str = include_str!("gpu/shaders/checker.wgsl");

/// Workgroup edge declared by [`CHECKER_TEXTURE_COMPUTE`].
pub const CHECKER_WORKGROUP_EDGE: u32 = 8;

/// Static gradient: red follows uv.x, green follows uv.y. No bindings.
pub const UV_GRADIENT_FRAGMENT: &str = include_str!("gpu/shaders/uv_gradient.wgsl");

/// Animated diagonal bands.
pub const WAVE_FRAGMENT: &str = include_str!("gpu/shaders/wave.wgsl");

/// Green channel pulsing with time.
pub const PULSE_FRAGMENT: &str = include_str!("gpu/shaders/pulse.wgsl");

/// Circle centered on the pointer.
pub const POINTER_CIRCLE_FRAGMENT: &str = include_str!("gpu/shaders/pointer_circle.wgsl");

/// Texture at binding 0 sampled with the sampler at binding 1.
pub const SAMPLE_TEXTURE_FRAGMENT: &str = include_str!("gpu/shaders/sample_texture.wgsl");

/// Look up a fragment preset by name.
pub fn fragment(name: &str) -> Option<&'static str> {
    match name {
        "uv-gradient" => Some(UV_GRADIENT_FRAGMENT),
        "wave" => Some(WAVE_FRAGMENT),
        "pulse" => Some(PULSE_FRAGMENT),
        "pointer-circle" => Some(POINTER_CIRCLE_FRAGMENT),
        _ => None,
    }
}

/// Names accepted by [`fragment`].
pub const FRAGMENT_PRESETS: &[&str] = &["uv-gradient", "wave", "pulse", "pointer-circle"];
