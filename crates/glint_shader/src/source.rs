// SPDX-License-Identifier: MIT OR Apache-2.0
//! The immutable output bundle of a shader build.

use serde::Serialize;

use glint_graph::NodeId;

use crate::analyzer::ParamType;
use crate::globals::{GlobalSamplerUsage, GlobalUniformUsage};

/// Where a uniform's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UniformUsage {
    /// Fed from a graph node per instance.
    Local,
    /// Fed by the pipeline once per frame.
    Global(GlobalUniformUsage),
}

/// Where a sampler's texture comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplerUsage {
    /// Fed from a texture node per instance.
    Local,
    /// An engine-owned texture.
    Global(GlobalSamplerUsage),
}

/// One uniform of the generated program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Uniform {
    /// GLSL name, generated for locals, well-known for globals.
    pub name: String,
    /// The value node feeding the uniform. `None` for globals.
    pub node: Option<NodeId>,
    /// Source of the value.
    pub usage: UniformUsage,
    /// GLSL value type.
    pub ty: ParamType,
}

/// One sampler of the generated program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sampler {
    /// GLSL name, generated for locals, well-known for globals.
    pub name: String,
    /// The texture node feeding the sampler. `None` for globals.
    pub node: Option<NodeId>,
    /// Source of the texture.
    pub usage: SamplerUsage,
    /// Whether the sampler is `sampler2DMS`.
    pub multisample: bool,
    /// Whether the sampler is `sampler2DShadow`.
    pub shadow: bool,
}

/// One shader storage buffer of the generated program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ssbo {
    /// Generated GLSL block name.
    pub name: String,
    /// The buffer node backing the SSBO.
    pub node: NodeId,
}

/// Complete output of one shader build: generated GLSL for both stages
/// plus the binding layout the host reconciles against the compiled
/// program. Never mutated after construction; a rebuild replaces the
/// whole bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaderSource {
    /// Merged uniforms of both stages, in uniform-block declaration
    /// order. This order is the binding contract with the host's uniform
    /// buffer.
    pub uniforms: Vec<Uniform>,
    /// Merged samplers of both stages.
    pub samplers: Vec<Sampler>,
    /// Merged SSBOs of both stages.
    pub ssbos: Vec<Ssbo>,
    /// Generated vertex stage GLSL.
    pub vertex_source: String,
    /// Generated fragment stage GLSL.
    pub fragment_source: String,
}
