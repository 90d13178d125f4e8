// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed tables of pipeline-supplied globals.
//!
//! Globals are structural constants of the rendering pipeline (time,
//! camera matrices, render target sizes, engine-owned textures). Stubs
//! reference them through `:global` directives; they keep their
//! well-known `g`-prefixed GLSL names instead of getting generated ones,
//! and the host fills them once per frame rather than per node.

use serde::{Deserialize, Serialize};

use crate::analyzer::ParamType;

/// Identity of a global uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalUniformUsage {
    /// Seconds since demo start.
    Time,
    /// View matrix.
    View,
    /// Projection matrix.
    Projection,
    /// Model transformation matrix.
    Transformation,
    /// Skylight shadow projection matrix.
    SkylightProjection,
    /// Direction of the skylight.
    SkylightDirection,
    /// Color of the skylight.
    SkylightColor,
    /// Noise map dimensions in pixels.
    NoiseMapSize,
    /// Reciprocal of the noise map dimensions.
    NoiseMapSizeRecip,
    /// Render target dimensions in pixels.
    RenderTargetSize,
    /// Reciprocal of the render target dimensions.
    RenderTargetSizeRecip,
    /// Viewport dimensions in pixels.
    ViewportSize,
    /// Size of one pixel in clip space.
    PixelSize,
    /// Material diffuse color.
    DiffuseColor,
    /// Material ambient color.
    AmbientColor,
    /// Shadow depth bias.
    DepthBias,
    /// Sample count of the G-buffer.
    GBufferSampleCount,
}

/// Identity of a global sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalSamplerUsage {
    /// Depth buffer of the G-buffer pass.
    DepthBufferSource,
    /// Color target of the G-buffer pass.
    GBufferSourceA,
    /// Secondary input texture for compositing.
    SecondaryTexture,
    /// Skylight shadow map.
    SkylightTexture,
    /// Skylight color map.
    SkylightColorTexture,
    /// Gaussian blur chain texture for postprocessing.
    PostprocessGauss,
}

/// A global uniform table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalUniformDef {
    /// Identity.
    pub usage: GlobalUniformUsage,
    /// Well-known GLSL name.
    pub name: &'static str,
    /// Required declared type.
    pub ty: ParamType,
}

/// A global sampler table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSamplerDef {
    /// Identity.
    pub usage: GlobalSamplerUsage,
    /// Well-known GLSL name.
    pub name: &'static str,
    /// Whether the sampler is `sampler2DMS`.
    pub multisample: bool,
    /// Whether the sampler is `sampler2DShadow`.
    pub shadow: bool,
}

/// All recognized global uniforms.
pub const GLOBAL_UNIFORMS: &[GlobalUniformDef] = &[
    GlobalUniformDef {
        usage: GlobalUniformUsage::Time,
        name: "gTime",
        ty: ParamType::Float,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::View,
        name: "gView",
        ty: ParamType::Mat4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::Projection,
        name: "gProjection",
        ty: ParamType::Mat4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::Transformation,
        name: "gTransformation",
        ty: ParamType::Mat4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::SkylightProjection,
        name: "gSkylightProjection",
        ty: ParamType::Mat4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::SkylightDirection,
        name: "gSkylightDirection",
        ty: ParamType::Vec3,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::SkylightColor,
        name: "gSkylightColor",
        ty: ParamType::Vec4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::NoiseMapSize,
        name: "gNoiseMapSize",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::NoiseMapSizeRecip,
        name: "gNoiseMapSizeRecip",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::RenderTargetSize,
        name: "gRenderTargetSize",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::RenderTargetSizeRecip,
        name: "gRenderTargetSizeRecip",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::ViewportSize,
        name: "gViewportSize",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::PixelSize,
        name: "gPixelSize",
        ty: ParamType::Vec2,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::DiffuseColor,
        name: "gDiffuseColor",
        ty: ParamType::Vec4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::AmbientColor,
        name: "gAmbientColor",
        ty: ParamType::Vec4,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::DepthBias,
        name: "gDepthBias",
        ty: ParamType::Float,
    },
    GlobalUniformDef {
        usage: GlobalUniformUsage::GBufferSampleCount,
        name: "gGBufferSampleCount",
        ty: ParamType::Float,
    },
];

/// All recognized global samplers.
pub const GLOBAL_SAMPLERS: &[GlobalSamplerDef] = &[
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::DepthBufferSource,
        name: "gDepthBufferSource",
        multisample: true,
        shadow: false,
    },
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::GBufferSourceA,
        name: "gGBufferSourceA",
        multisample: true,
        shadow: false,
    },
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::SecondaryTexture,
        name: "gSecondaryTexture",
        multisample: false,
        shadow: false,
    },
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::SkylightTexture,
        name: "gSkylightTexture",
        multisample: false,
        shadow: true,
    },
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::SkylightColorTexture,
        name: "gSkylightColorTexture",
        multisample: false,
        shadow: false,
    },
    GlobalSamplerDef {
        usage: GlobalSamplerUsage::PostprocessGauss,
        name: "gPPGauss",
        multisample: false,
        shadow: false,
    },
];

/// Looks up a global uniform by its GLSL name.
pub fn global_uniform(name: &str) -> Option<&'static GlobalUniformDef> {
    GLOBAL_UNIFORMS.iter().find(|def| def.name == name)
}

/// Looks up a global sampler by its GLSL name.
pub fn global_sampler(name: &str) -> Option<&'static GlobalSamplerDef> {
    GLOBAL_SAMPLERS.iter().find(|def| def.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let time = global_uniform("gTime").unwrap();
        assert_eq!(time.usage, GlobalUniformUsage::Time);
        assert_eq!(time.ty, ParamType::Float);
        assert!(global_uniform("gNoSuchThing").is_none());
        assert!(global_uniform("gGBufferSourceA").is_none());
        assert!(global_sampler("gGBufferSourceA").is_some());
    }

    #[test]
    fn test_sampler_flags() {
        assert!(global_sampler("gGBufferSourceA").unwrap().multisample);
        assert!(global_sampler("gSkylightTexture").unwrap().shadow);
        let plain = global_sampler("gSecondaryTexture").unwrap();
        assert!(!plain.multisample && !plain.shadow);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in GLOBAL_UNIFORMS.iter().enumerate() {
            assert!(GLOBAL_UNIFORMS.iter().skip(i + 1).all(|b| b.name != a.name));
            assert!(global_sampler(a.name).is_none());
        }
        for (i, a) in GLOBAL_SAMPLERS.iter().enumerate() {
            assert!(GLOBAL_SAMPLERS.iter().skip(i + 1).all(|b| b.name != a.name));
        }
    }
}
