//! WebGPU feature names.
//!
//! Maps the `GPUFeatureName` strings used by WebGPU to `wgpu::Features`
//! flags so requested features can be written in config files.

use wgpu::Features;

const FEATURE_NAMES: &[(&str, Features)] = &[
    ("depth-clip-control", Features::DEPTH_CLIP_CONTROL),
    ("depth32float-stencil8", Features::DEPTH32FLOAT_STENCIL8),
    ("texture-compression-bc", Features::TEXTURE_COMPRESSION_BC),
    ("texture-compression-etc2", Features::TEXTURE_COMPRESSION_ETC2),
    ("texture-compression-astc", Features::TEXTURE_COMPRESSION_ASTC),
    ("timestamp-query", Features::TIMESTAMP_QUERY),
    ("indirect-first-instance", Features::INDIRECT_FIRST_INSTANCE),
    ("shader-f16", Features::SHADER_F16),
    ("rg11b10ufloat-renderable", Features::RG11B10UFLOAT_RENDERABLE),
    ("bgra8unorm-storage", Features::BGRA8UNORM_STORAGE),
    ("float32-filterable", Features::FLOAT32_FILTERABLE),
    ("dual-source-blending", Features::DUAL_SOURCE_BLENDING),
];

/// Look up the flag for a WebGPU feature name.
pub fn parse_feature(name: &str) -> Option<Features> {
    let name = name.trim().to_lowercase();
    FEATURE_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

/// Names of every known feature contained in `features`.
pub fn feature_names(features: Features) -> Vec<&'static str> {
    FEATURE_NAMES
        .iter()
        .filter(|(_, f)| features.contains(*f))
        .map(|(n, _)| *n)
        .collect()
}

/// All feature names this table understands.
pub fn known_features() -> impl Iterator<Item = &'static str> {
    FEATURE_NAMES.iter().map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_feature() {
        assert_eq!(parse_feature("shader-f16"), Some(Features::SHADER_F16));
        assert_eq!(parse_feature(" Timestamp-Query "), Some(Features::TIMESTAMP_QUERY));
    }

    #[test]
    fn test_parse_unknown_feature() {
        assert_eq!(parse_feature("warp-drive"), None);
    }

    #[test]
    fn test_feature_names_lists_contained_flags() {
        let names = feature_names(Features::SHADER_F16 | Features::FLOAT32_FILTERABLE);
        assert_eq!(names, vec!["shader-f16", "float32-filterable"]);
        assert!(feature_names(Features::empty()).is_empty());
    }

    #[test]
    fn test_every_name_parses_back() {
        for name in known_features() {
            let flag = parse_feature(name).unwrap();
            assert_eq!(feature_names(flag), vec![name]);
        }
    }
}
