// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assembles complete GLSL programs from stub graphs.
//!
//! A build walks the dependency graph of a vertex and a fragment root
//! stub, collects every reachable stub and resource node, and splices
//! the stub sources into one translation unit per stage. Stubs become
//! preprocessor-wrapped functions called from `main` in dependency
//! order; value nodes become uniforms, texture nodes samplers, buffer
//! nodes SSBOs. Names are assigned in encounter order, so the same
//! graph always builds the same source text.

use std::fmt::Write as _;
use std::mem;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{error, warn};

use glint_graph::{Graph, NodeId, NodeKind, ValueKind};

use crate::analyzer::{ParamType, StubMetadata, StubParameter};
use crate::globals::{GlobalSamplerUsage, GlobalUniformUsage};
use crate::library::StubLibrary;
use crate::resources::TextureOp;
use crate::source::{Sampler, SamplerUsage, ShaderSource, Ssbo, Uniform, UniformUsage};
use crate::stub::StubOp;

/// Why a shader source could not be assembled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// A stage root is not a stub node.
    #[error("node {0} is not a shader stub")]
    NotAStub(NodeId),
    /// A stub in the dependency graph has no analyzed metadata.
    #[error("stub {0} has no analyzed metadata")]
    MissingMetadata(NodeId),
    /// A texture or buffer parameter has nothing connected.
    #[error("parameter {param:?} of stub {stub:?} is not connected")]
    IncompleteGraph {
        /// Name of the stub owning the parameter.
        stub: String,
        /// Name of the unconnected parameter.
        param: String,
    },
    /// A dependency node cannot feed a shader parameter.
    #[error("node {0} cannot feed a shader parameter")]
    UnsupportedDependency(NodeId),
}

/// Generated identity of one stub within a stage.
struct StubRef {
    metadata: Rc<StubMetadata>,
    function_name: String,
    /// Holds the stub's result between function calls. `None` for void
    /// stubs.
    variable_name: Option<String>,
}

/// Everything collected for one shader stage.
struct Stage {
    is_vertex: bool,
    /// Stubs in dependency order. A stub appears after everything it
    /// reads from, so its function can reference their result variables.
    stubs: IndexMap<NodeId, StubRef>,
    /// Preprocessor symbols marking live texture connections.
    defines: Vec<String>,
    inputs: IndexMap<String, ParamType>,
    outputs: IndexMap<String, ParamType>,
    source: String,
}

impl Stage {
    fn new(is_vertex: bool) -> Self {
        Self {
            is_vertex,
            stubs: IndexMap::new(),
            defines: Vec::new(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            source: String::new(),
        }
    }
}

struct LocalUniform {
    name: String,
    ty: ParamType,
}

/// One-shot shader source assembler.
///
/// The maps keyed by node id are shared between the two stages, so a
/// value node feeding both stages binds a single uniform.
pub struct ShaderBuilder<'a> {
    graph: &'a Graph,
    uniform_map: IndexMap<NodeId, LocalUniform>,
    sampler_map: IndexMap<NodeId, String>,
    buffer_map: IndexMap<NodeId, String>,
    used_globals: IndexSet<GlobalUniformUsage>,
    used_global_samplers: IndexSet<GlobalSamplerUsage>,
    uniforms: Vec<Uniform>,
    samplers: Vec<Sampler>,
    ssbos: Vec<Ssbo>,
}

impl<'a> ShaderBuilder<'a> {
    /// Builds the shader source for a vertex and fragment root stub.
    pub fn from_stubs(
        graph: &'a Graph,
        library: &StubLibrary,
        vertex: NodeId,
        fragment: NodeId,
    ) -> Result<ShaderSource, BuildError> {
        let mut builder = ShaderBuilder {
            graph,
            uniform_map: IndexMap::new(),
            sampler_map: IndexMap::new(),
            buffer_map: IndexMap::new(),
            used_globals: IndexSet::new(),
            used_global_samplers: IndexSet::new(),
            uniforms: Vec::new(),
            samplers: Vec::new(),
            ssbos: Vec::new(),
        };
        match builder.build(library, vertex, fragment) {
            Ok(source) => Ok(source),
            Err(err) => {
                error!(%err, "shader source creation failed");
                Err(err)
            }
        }
    }

    fn build(
        &mut self,
        library: &StubLibrary,
        vertex: NodeId,
        fragment: NodeId,
    ) -> Result<ShaderSource, BuildError> {
        let mut vertex_stage = Stage::new(true);
        let mut fragment_stage = Stage::new(false);
        self.collect(library, vertex, &mut vertex_stage)?;
        self.collect(library, fragment, &mut fragment_stage)?;

        generate_stub_names(&mut vertex_stage);
        generate_stub_names(&mut fragment_stage);
        self.generate_resource_names();
        self.add_globals(&vertex_stage);
        self.add_globals(&fragment_stage);
        self.add_locals();

        self.generate_source(&mut vertex_stage)?;
        self.generate_source(&mut fragment_stage)?;

        Ok(ShaderSource {
            uniforms: mem::take(&mut self.uniforms),
            samplers: mem::take(&mut self.samplers),
            ssbos: mem::take(&mut self.ssbos),
            vertex_source: vertex_stage.source,
            fragment_source: fragment_stage.source,
        })
    }

    /// Gathers the stage's dependency graph, uber stub first so its
    /// helpers precede everything that may call them.
    fn collect(
        &mut self,
        library: &StubLibrary,
        root: NodeId,
        stage: &mut Stage,
    ) -> Result<(), BuildError> {
        if self.graph.kind_of(root) != Some(NodeKind::Stub) {
            return Err(BuildError::NotAStub(root));
        }
        let mut visited = IndexSet::new();
        self.traverse(library.uber(), stage, &mut visited)?;
        self.traverse(root, stage, &mut visited)
    }

    fn traverse(
        &mut self,
        node: NodeId,
        stage: &mut Stage,
        visited: &mut IndexSet<NodeId>,
    ) -> Result<(), BuildError> {
        if !visited.insert(node) {
            return Ok(());
        }
        match self.graph.kind_of(node) {
            Some(NodeKind::Stub) => {
                let metadata = self
                    .graph
                    .op_as::<StubOp>(node)
                    .and_then(|op| op.metadata().cloned())
                    .ok_or(BuildError::MissingMetadata(node))?;
                for param in &metadata.parameters {
                    let Some(target) = self.graph.referenced_node(node, &param.name) else {
                        return Err(BuildError::IncompleteGraph {
                            stub: metadata.name.clone(),
                            param: param.name.clone(),
                        });
                    };
                    if matches!(param.ty, ParamType::Sampler2D | ParamType::Image2D) {
                        let live = self
                            .graph
                            .op_as::<TextureOp>(target)
                            .is_some_and(|op| op.texture().is_some());
                        if live {
                            stage.defines.push(format!("{}_CONNECTED", param.name));
                        }
                    }
                    self.traverse(target, stage, visited)?;
                }
                for input in &metadata.inputs {
                    if stage.is_vertex {
                        warn!(
                            stub = %metadata.name,
                            input = %input.name,
                            "vertex stage uses fixed attributes, input ignored"
                        );
                    } else {
                        stage.inputs.entry(input.name.clone()).or_insert(input.ty);
                    }
                }
                for output in &metadata.outputs {
                    stage
                        .outputs
                        .entry(output.name.clone())
                        .or_insert(output.ty);
                }
                stage.stubs.insert(
                    node,
                    StubRef {
                        metadata,
                        function_name: String::new(),
                        variable_name: None,
                    },
                );
                Ok(())
            }
            Some(NodeKind::Value(kind)) => {
                let ty =
                    value_param_type(kind).ok_or(BuildError::UnsupportedDependency(node))?;
                self.uniform_map.entry(node).or_insert(LocalUniform {
                    name: String::new(),
                    ty,
                });
                Ok(())
            }
            Some(NodeKind::Texture) => {
                self.sampler_map.entry(node).or_default();
                Ok(())
            }
            Some(NodeKind::Buffer) => {
                self.buffer_map.entry(node).or_default();
                Ok(())
            }
            _ => Err(BuildError::UnsupportedDependency(node)),
        }
    }

    fn generate_resource_names(&mut self) {
        for (index, uniform) in self.uniform_map.values_mut().enumerate() {
            uniform.name = format!("_uniform_{}", index + 1);
        }
        for (index, name) in self.sampler_map.values_mut().enumerate() {
            *name = format!("_sampler_{}", index + 1);
        }
        for (index, name) in self.buffer_map.values_mut().enumerate() {
            *name = format!("_buffer_{}", index + 1);
        }
    }

    /// Registers the global references of a stage's stubs. Each global
    /// is declared once no matter how many stubs mention it.
    fn add_globals(&mut self, stage: &Stage) {
        for stub_ref in stage.stubs.values() {
            for global in &stub_ref.metadata.global_uniforms {
                if self.used_globals.insert(global.usage) {
                    self.uniforms.push(Uniform {
                        name: global.name.clone(),
                        node: None,
                        usage: UniformUsage::Global(global.usage),
                        ty: global.ty,
                    });
                }
            }
            for global in &stub_ref.metadata.global_samplers {
                if self.used_global_samplers.insert(global.usage) {
                    self.samplers.push(Sampler {
                        name: global.name.clone(),
                        node: None,
                        usage: SamplerUsage::Global(global.usage),
                        multisample: global.multisample,
                        shadow: global.shadow,
                    });
                }
            }
        }
    }

    fn add_locals(&mut self) {
        for (node, uniform) in &self.uniform_map {
            self.uniforms.push(Uniform {
                name: uniform.name.clone(),
                node: Some(*node),
                usage: UniformUsage::Local,
                ty: uniform.ty,
            });
        }
        for (node, name) in &self.sampler_map {
            self.samplers.push(Sampler {
                name: name.clone(),
                node: Some(*node),
                usage: SamplerUsage::Local,
                multisample: false,
                shadow: false,
            });
        }
        for (node, name) in &self.buffer_map {
            self.ssbos.push(Ssbo {
                name: name.clone(),
                node: *node,
            });
        }
    }

    fn generate_source(&self, stage: &mut Stage) -> Result<(), BuildError> {
        let mut out = String::new();
        let _ = writeln!(out, "#version 430 core");
        let _ = writeln!(
            out,
            "#define {}",
            if stage.is_vertex {
                "VERTEX_SHADER"
            } else {
                "FRAGMENT_SHADER"
            }
        );
        for define in &stage.defines {
            let _ = writeln!(out, "#define {define}");
        }

        if stage.is_vertex {
            out.push_str("layout(location = 0) in vec3 aPosition;\n");
            out.push_str("layout(location = 1) in vec2 aTexCoord;\n");
            out.push_str("layout(location = 2) in vec3 aNormal;\n");
            out.push_str("layout(location = 3) in vec3 aTangent;\n");
        } else {
            for (name, ty) in &stage.inputs {
                let _ = writeln!(out, "in {} {name};", ty.glsl_name());
            }
        }
        for (name, ty) in &stage.outputs {
            match output_location(name) {
                Some(location) => {
                    let _ = writeln!(
                        out,
                        "layout (location = {location}) out {} {name};",
                        ty.glsl_name()
                    );
                }
                None => {
                    let _ = writeln!(out, "out {} {name};", ty.glsl_name());
                }
            }
        }

        if !self.uniforms.is_empty() {
            out.push_str("layout(shared) uniform Uniforms {\n");
            for uniform in &self.uniforms {
                let _ = writeln!(out, "  {} {};", uniform.ty.glsl_name(), uniform.name);
            }
            out.push_str("};\n");
        }
        for sampler in &self.samplers {
            let ty = if sampler.multisample {
                "sampler2DMS"
            } else if sampler.shadow {
                "sampler2DShadow"
            } else {
                "sampler2D"
            };
            let _ = writeln!(out, "uniform {ty} {};", sampler.name);
        }
        for ssbo in &self.ssbos {
            let _ = writeln!(out, "layout(std140) buffer {} {{", ssbo.name);
            let _ = writeln!(out, "  vec4 {}_items[];", ssbo.name);
            out.push_str("};\n");
        }

        for stub_ref in stage.stubs.values() {
            if let Some(variable) = &stub_ref.variable_name {
                let _ = writeln!(
                    out,
                    "{} {variable};",
                    stub_ref.metadata.return_type.glsl_name()
                );
            }
        }

        for (node, stub_ref) in &stage.stubs {
            out.push('\n');
            for param in &stub_ref.metadata.parameters {
                let resolved = self.resolve_param(stage, *node, param)?;
                let _ = writeln!(out, "#define {} {resolved}", param.name);
            }
            let _ = writeln!(
                out,
                "#define SHADER {} {}()",
                stub_ref.metadata.return_type.glsl_name(),
                stub_ref.function_name
            );
            out.push_str(&stub_ref.metadata.stripped_source);
            out.push_str("#undef SHADER\n");
            for param in &stub_ref.metadata.parameters {
                let _ = writeln!(out, "#undef {}", param.name);
            }
        }

        out.push_str("\nvoid main() {\n");
        for stub_ref in stage.stubs.values() {
            match &stub_ref.variable_name {
                Some(variable) => {
                    let _ = writeln!(out, "  {variable} = {}();", stub_ref.function_name);
                }
                None => {
                    let _ = writeln!(out, "  {}();", stub_ref.function_name);
                }
            }
        }
        out.push_str("}\n");

        stage.source = out;
        Ok(())
    }

    /// The GLSL expression a stub parameter expands to.
    fn resolve_param(
        &self,
        stage: &Stage,
        owner: NodeId,
        param: &StubParameter,
    ) -> Result<String, BuildError> {
        let owner_name = stage
            .stubs
            .get(&owner)
            .map(|s| s.metadata.name.clone())
            .unwrap_or_default();
        let target = self
            .graph
            .referenced_node(owner, &param.name)
            .ok_or_else(|| BuildError::IncompleteGraph {
                stub: owner_name,
                param: param.name.clone(),
            })?;
        match self.graph.kind_of(target) {
            Some(NodeKind::Stub) => stage
                .stubs
                .get(&target)
                .and_then(|s| s.variable_name.clone())
                .ok_or(BuildError::UnsupportedDependency(target)),
            Some(NodeKind::Value(_)) => self
                .uniform_map
                .get(&target)
                .map(|u| u.name.clone())
                .ok_or(BuildError::UnsupportedDependency(target)),
            Some(NodeKind::Texture) => self
                .sampler_map
                .get(&target)
                .cloned()
                .ok_or(BuildError::UnsupportedDependency(target)),
            Some(NodeKind::Buffer) => self
                .buffer_map
                .get(&target)
                .map(|name| format!("{name}_items"))
                .ok_or(BuildError::UnsupportedDependency(target)),
            _ => Err(BuildError::UnsupportedDependency(target)),
        }
    }
}

/// Assigns stage-local function and result variable names. The stub map
/// is already in dependency order, so numbering follows it.
fn generate_stub_names(stage: &mut Stage) {
    for (index, stub_ref) in stage.stubs.values_mut().enumerate() {
        let ordinal = index + 1;
        stub_ref.function_name = format!("_func_{ordinal}");
        if stub_ref.metadata.return_type != ParamType::Void {
            stub_ref.variable_name = Some(format!("_var_{ordinal}"));
        }
    }
}

fn value_param_type(kind: ValueKind) -> Option<ParamType> {
    match kind {
        ValueKind::Float => Some(ParamType::Float),
        ValueKind::Vec2 => Some(ParamType::Vec2),
        ValueKind::Vec3 => Some(ParamType::Vec3),
        ValueKind::Vec4 => Some(ParamType::Vec4),
        ValueKind::Mat4 => Some(ParamType::Mat4),
        ValueKind::Text => None,
    }
}

/// G-buffer targets have fixed output locations; everything else lets
/// the linker assign one.
fn output_location(name: &str) -> Option<u32> {
    match name {
        "GBufferTargetA" => Some(0),
        "GBufferTargetB" => Some(1),
        "GBufferTargetC" => Some(2),
        "GBufferTargetD" => Some(3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BufferOp, GpuBuffer, Texture};
    use glint_graph::{StaticValueOp, Value};
    use std::rc::Rc;

    struct Fixture {
        graph: Graph,
        library: StubLibrary,
    }

    impl Fixture {
        fn new() -> Self {
            let _ = tracing_subscriber::fmt().with_test_writer().try_init();
            let mut graph = Graph::new();
            let library = StubLibrary::new(&mut graph);
            Fixture { graph, library }
        }

        fn stub(&mut self, name: &str, source: &str) -> NodeId {
            self.library
                .set_stub_source(&mut self.graph, name, source)
        }

        fn build(&self, vertex: NodeId, fragment: NodeId) -> Result<ShaderSource, BuildError> {
            ShaderBuilder::from_stubs(&self.graph, &self.library, vertex, fragment)
        }
    }

    const PLAIN_VERTEX: &str = ":name \"v\"\n:returns void\nSHADER { gl_Position = vec4(aPosition, 1.0); }\n";

    #[test]
    fn test_builds_are_deterministic() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param float brightness\n:output vec4 FragColor\nSHADER { FragColor = vec4(brightness); }\n",
        );
        let first = fx.build(vertex, fragment).unwrap();
        let second = fx.build(vertex, fragment).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_value_node_binds_one_uniform() {
        let mut fx = Fixture::new();
        let vertex = fx.stub(
            "v",
            ":name \"v\"\n:returns void\n:param float amount\nSHADER { gl_Position = vec4(amount); }\n",
        );
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param float amount\n:output vec4 FragColor\nSHADER { FragColor = vec4(amount); }\n",
        );
        let value = fx
            .graph
            .add_node(Box::new(StaticValueOp::new(Value::Float(0.5))));
        fx.graph.connect(vertex, "amount", Some(value)).unwrap();
        fx.graph.connect(fragment, "amount", Some(value)).unwrap();

        let source = fx.build(vertex, fragment).unwrap();
        let locals: Vec<_> = source
            .uniforms
            .iter()
            .filter(|u| u.usage == UniformUsage::Local)
            .collect();
        assert_eq!(locals.len(), 1);
        assert_eq!(locals[0].name, "_uniform_1");
        assert_eq!(locals[0].node, Some(value));
        assert!(source.vertex_source.contains("#define amount _uniform_1"));
        assert!(source.fragment_source.contains("#define amount _uniform_1"));
    }

    #[test]
    fn test_unconnected_sampler_param_is_rejected() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param sampler2D image\nSHADER { }\n",
        );
        let err = fx.build(vertex, fragment).unwrap_err();
        assert_eq!(
            err,
            BuildError::IncompleteGraph {
                stub: "f".to_owned(),
                param: "image".to_owned(),
            }
        );
    }

    #[test]
    fn test_live_texture_gets_connected_define() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param sampler2D image\nSHADER { }\n",
        );
        let texture = fx.graph.add_node(Box::new(TextureOp::new(Some(Rc::new(
            Texture {
                handle: 7,
                width: 4,
                height: 4,
            },
        )))));
        fx.graph.connect(fragment, "image", Some(texture)).unwrap();

        let source = fx.build(vertex, fragment).unwrap();
        assert!(source.fragment_source.contains("#define image_CONNECTED"));
        assert!(source.fragment_source.contains("uniform sampler2D _sampler_1;"));
        assert!(source.fragment_source.contains("#define image _sampler_1"));
    }

    #[test]
    fn test_absent_texture_skips_connected_define() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param sampler2D image\nSHADER { }\n",
        );
        let texture = fx.graph.add_node(Box::new(TextureOp::new(None)));
        fx.graph.connect(fragment, "image", Some(texture)).unwrap();

        let source = fx.build(vertex, fragment).unwrap();
        assert!(!source.fragment_source.contains("image_CONNECTED"));
    }

    #[test]
    fn test_uber_helpers_precede_stage_roots() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub("f", ":name \"f\"\n:returns void\nSHADER { }\n");
        let source = fx.build(vertex, fragment).unwrap();
        let helpers = source.fragment_source.find("linearToSrgb").unwrap();
        let root = source.fragment_source.find("_func_2").unwrap();
        assert!(helpers < root);
    }

    #[test]
    fn test_stub_dependency_expands_to_result_variable() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let producer = fx.stub(
            "producer",
            ":name \"producer\"\n:returns vec4\nSHADER { return vec4(1.0); }\n",
        );
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param vec4 color\n:output vec4 FragColor\nSHADER { FragColor = color; }\n",
        );
        fx.graph.connect(fragment, "color", Some(producer)).unwrap();

        let source = fx.build(vertex, fragment).unwrap();
        // uber is _func_1, so the producer lands on _func_2 / _var_2
        assert!(source.fragment_source.contains("vec4 _var_2;"));
        assert!(source.fragment_source.contains("#define color _var_2"));
        assert!(source.fragment_source.contains("  _var_2 = _func_2();"));
        let produce = source.fragment_source.find("_var_2 = _func_2();").unwrap();
        let consume = source.fragment_source.find("_func_3();").unwrap();
        assert!(produce < consume);
    }

    #[test]
    fn test_globals_are_declared_once() {
        let mut fx = Fixture::new();
        let vertex = fx.stub(
            "v",
            ":name \"v\"\n:returns void\n:global float gTime\nSHADER { gl_Position = vec4(gTime); }\n",
        );
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:global float gTime\n:global vec3 gSkylightDirection\nSHADER { }\n",
        );
        let source = fx.build(vertex, fragment).unwrap();
        let time_uniforms = source
            .uniforms
            .iter()
            .filter(|u| u.name == "gTime")
            .count();
        assert_eq!(time_uniforms, 1);
        assert_eq!(
            source.fragment_source.matches("  float gTime;").count(),
            1
        );
        assert!(source
            .fragment_source
            .contains("  vec3 gSkylightDirection;"));
    }

    #[test]
    fn test_global_shadow_sampler_keeps_its_type() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:global sampler2DShadow gSkylightTexture\nSHADER { }\n",
        );
        let source = fx.build(vertex, fragment).unwrap();
        assert!(source
            .fragment_source
            .contains("uniform sampler2DShadow gSkylightTexture;"));
        assert_eq!(source.samplers.len(), 1);
        assert!(source.samplers[0].shadow);
    }

    #[test]
    fn test_gbuffer_outputs_get_fixed_locations() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:output vec4 GBufferTargetA\n:output vec4 GBufferTargetC\nSHADER { }\n",
        );
        let source = fx.build(vertex, fragment).unwrap();
        assert!(source
            .fragment_source
            .contains("layout (location = 0) out vec4 GBufferTargetA;"));
        assert!(source
            .fragment_source
            .contains("layout (location = 2) out vec4 GBufferTargetC;"));
    }

    #[test]
    fn test_buffer_param_becomes_ssbo() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param buffer points\nSHADER { }\n",
        );
        let buffer = fx
            .graph
            .add_node(Box::new(BufferOp::new(Some(Rc::new(GpuBuffer {
                handle: 3,
                byte_size: 256,
            })))));
        fx.graph.connect(fragment, "points", Some(buffer)).unwrap();

        let source = fx.build(vertex, fragment).unwrap();
        assert!(source
            .fragment_source
            .contains("layout(std140) buffer _buffer_1 {"));
        assert!(source.fragment_source.contains("  vec4 _buffer_1_items[];"));
        assert!(source
            .fragment_source
            .contains("#define points _buffer_1_items"));
        assert_eq!(source.ssbos.len(), 1);
        assert_eq!(source.ssbos[0].node, buffer);
    }

    #[test]
    fn test_unconnected_value_param_reads_its_default_uniform() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let fragment = fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param float brightness\nSHADER { }\n",
        );
        let source = fx.build(vertex, fragment).unwrap();
        let locals: Vec<_> = source
            .uniforms
            .iter()
            .filter(|u| u.usage == UniformUsage::Local)
            .collect();
        assert_eq!(locals.len(), 1);
        assert_eq!(
            locals[0].node,
            fx.graph.referenced_node(fragment, "brightness")
        );
        assert!(source
            .fragment_source
            .contains("#define brightness _uniform_1"));
    }

    #[test]
    fn test_fragment_root_must_be_a_stub() {
        let mut fx = Fixture::new();
        let vertex = fx.stub("v", PLAIN_VERTEX);
        let value = fx
            .graph
            .add_node(Box::new(StaticValueOp::new(Value::Float(1.0))));
        assert_eq!(
            fx.build(vertex, value).unwrap_err(),
            BuildError::NotAStub(value)
        );
    }
}
