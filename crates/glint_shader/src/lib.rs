// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader stub DSL for the glint demo tool.
//!
//! A *stub* is a small annotated GLSL fragment: directive lines declare its
//! name, return type, parameters, global uniform usage and stage
//! interface; the rest is plain GLSL. Stubs live as nodes in a
//! [`glint_graph::Graph`] and expose their parameters as slots, so wiring
//! values, textures and other stubs into a shader is a graph edit.
//!
//! The pipeline: [`tokenizer`] splits stub text into classified words,
//! [`analyzer`] turns them into [`analyzer::StubMetadata`], [`stub::StubOp`]
//! keeps a stub node's slots in sync with its source, and
//! [`builder::ShaderBuilder`] walks the dependency graph of a vertex and a
//! fragment stub to emit complete GLSL plus its uniform binding layout.

pub mod analyzer;
pub mod builder;
pub mod globals;
pub mod library;
pub mod material;
pub mod pass;
pub mod resources;
pub mod source;
pub mod stub;
pub mod tokenizer;

pub use analyzer::{ParamType, StubError, StubMetadata};
pub use builder::{BuildError, ShaderBuilder};
pub use globals::{GlobalSamplerUsage, GlobalUniformUsage};
pub use library::StubLibrary;
pub use material::MaterialOp;
pub use pass::{PassOp, ShaderCompiler, ShaderProgram};
pub use resources::{BufferOp, GpuBuffer, Texture, TextureOp};
pub use source::ShaderSource;
pub use stub::StubOp;
