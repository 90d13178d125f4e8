// SPDX-License-Identifier: MIT OR Apache-2.0
//! The render pass node: a vertex and fragment stub compiled together.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, warn};

use glint_graph::{NodeKind, NodeOp, OpCtx, SlotKind, SlotSpec};

use crate::builder::ShaderBuilder;
use crate::library::StubLibrary;
use crate::source::ShaderSource;

/// Name of the slot holding the vertex stage root stub.
pub const VERTEX_SLOT: &str = "vertex";
/// Name of the slot holding the fragment stage root stub.
pub const FRAGMENT_SLOT: &str = "fragment";

/// A compiled and linked GPU program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    /// Host-side program handle.
    pub handle: u32,
    /// Uniform names the linker kept alive.
    pub active_uniforms: Vec<String>,
}

/// Host hook turning generated GLSL into a program.
///
/// Returns `None` when compilation or linking fails; the pass then
/// keeps its previous program so the output never goes black over a
/// mid-edit error.
pub trait ShaderCompiler {
    /// Compiles and links one vertex and fragment source pair.
    fn create_shader_from_source(&mut self, vertex: &str, fragment: &str)
        -> Option<ShaderProgram>;
}

/// A node owning one shader build.
///
/// When either root stub slot changes, or anything those stubs depend
/// on, the next update rebuilds the shader source and recompiles it.
/// Every failure path keeps the previous source and program.
pub struct PassOp {
    library: Rc<RefCell<StubLibrary>>,
    compiler: Option<Rc<RefCell<dyn ShaderCompiler>>>,
    shader_source: Option<Rc<ShaderSource>>,
    program: Option<ShaderProgram>,
}

impl PassOp {
    /// Creates a pass using the given stub library. Without a compiler
    /// the pass only maintains the generated source.
    pub fn new(
        library: Rc<RefCell<StubLibrary>>,
        compiler: Option<Rc<RefCell<dyn ShaderCompiler>>>,
    ) -> Self {
        Self {
            library,
            compiler,
            shader_source: None,
            program: None,
        }
    }

    /// The last successfully built shader source.
    pub fn shader_source(&self) -> Option<&Rc<ShaderSource>> {
        self.shader_source.as_ref()
    }

    /// The last successfully compiled program.
    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }
}

impl NodeOp for PassOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Pass
    }

    fn initial_slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::new(VERTEX_SLOT, SlotKind::Stub),
            SlotSpec::new(FRAGMENT_SLOT, SlotKind::Stub),
        ]
    }

    fn operate(&mut self, ctx: &mut OpCtx<'_>) {
        let Some(vertex) = ctx.graph.referenced_node(ctx.node, VERTEX_SLOT) else {
            warn!(node = %ctx.node, "pass has no vertex stub");
            return;
        };
        let Some(fragment) = ctx.graph.referenced_node(ctx.node, FRAGMENT_SLOT) else {
            warn!(node = %ctx.node, "pass has no fragment stub");
            return;
        };
        let library = self.library.borrow();
        let Ok(source) = ShaderBuilder::from_stubs(ctx.graph, &library, vertex, fragment) else {
            // already logged by the builder, previous source stays live
            return;
        };
        let source = Rc::new(source);
        if let Some(compiler) = &self.compiler {
            match compiler
                .borrow_mut()
                .create_shader_from_source(&source.vertex_source, &source.fragment_source)
            {
                Some(program) => {
                    self.program = Some(program);
                    self.shader_source = Some(source);
                }
                None => {
                    error!(node = %ctx.node, "shader compilation failed, keeping previous program");
                }
            }
        } else {
            self.shader_source = Some(source);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_graph::{Graph, GraphError, NodeId, StaticValueOp, Value};

    struct MockCompiler {
        calls: usize,
        fail: bool,
    }

    impl MockCompiler {
        fn new() -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                calls: 0,
                fail: false,
            }))
        }
    }

    impl ShaderCompiler for MockCompiler {
        fn create_shader_from_source(
            &mut self,
            _vertex: &str,
            _fragment: &str,
        ) -> Option<ShaderProgram> {
            self.calls += 1;
            if self.fail {
                None
            } else {
                Some(ShaderProgram {
                    handle: self.calls as u32,
                    active_uniforms: Vec::new(),
                })
            }
        }
    }

    struct Fixture {
        graph: Graph,
        library: Rc<RefCell<StubLibrary>>,
        compiler: Rc<RefCell<MockCompiler>>,
        pass: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut graph = Graph::new();
            let library = Rc::new(RefCell::new(StubLibrary::new(&mut graph)));
            let compiler = MockCompiler::new();
            let pass = graph.add_node(Box::new(PassOp::new(
                library.clone(),
                Some(compiler.clone()),
            )));
            let mut fx = Fixture {
                graph,
                library,
                compiler,
                pass,
            };
            let vertex = fx.stub(
                "v",
                ":name \"v\"\n:returns void\nSHADER { gl_Position = vec4(aPosition, 1.0); }\n",
            );
            let fragment = fx.stub(
                "f",
                ":name \"f\"\n:returns void\n:output vec4 FragColor\nSHADER { FragColor = vec4(1.0); }\n",
            );
            fx.graph.connect(fx.pass, VERTEX_SLOT, Some(vertex)).unwrap();
            fx.graph
                .connect(fx.pass, FRAGMENT_SLOT, Some(fragment))
                .unwrap();
            fx
        }

        fn stub(&mut self, name: &str, source: &str) -> NodeId {
            self.library
                .borrow_mut()
                .set_stub_source(&mut self.graph, name, source)
        }

        fn pass_op(&self) -> &PassOp {
            self.graph.op_as::<PassOp>(self.pass).unwrap()
        }
    }

    #[test]
    fn test_update_builds_and_compiles() {
        let mut fx = Fixture::new();
        fx.graph.update(fx.pass);
        assert_eq!(fx.compiler.borrow().calls, 1);
        assert!(fx.pass_op().shader_source().is_some());
        assert_eq!(fx.pass_op().program().map(|p| p.handle), Some(1));
    }

    #[test]
    fn test_update_is_memoized() {
        let mut fx = Fixture::new();
        fx.graph.update(fx.pass);
        fx.graph.update(fx.pass);
        assert_eq!(fx.compiler.borrow().calls, 1);
    }

    #[test]
    fn test_stub_edit_triggers_recompile() {
        let mut fx = Fixture::new();
        fx.graph.update(fx.pass);
        fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:output vec4 FragColor\nSHADER { FragColor = vec4(0.5); }\n",
        );
        fx.graph.update(fx.pass);
        assert_eq!(fx.compiler.borrow().calls, 2);
        assert_eq!(fx.pass_op().program().map(|p| p.handle), Some(2));
    }

    #[test]
    fn test_broken_build_keeps_previous_output() {
        let mut fx = Fixture::new();
        fx.graph.update(fx.pass);
        let old_source = fx.pass_op().shader_source().cloned();

        // sampler param with nothing connected fails the build
        fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:param sampler2D image\nSHADER { }\n",
        );
        fx.graph.update(fx.pass);
        assert_eq!(fx.compiler.borrow().calls, 1);
        assert_eq!(fx.pass_op().shader_source().cloned(), old_source);
        assert_eq!(fx.pass_op().program().map(|p| p.handle), Some(1));
    }

    #[test]
    fn test_compile_failure_keeps_previous_program() {
        let mut fx = Fixture::new();
        fx.graph.update(fx.pass);
        fx.compiler.borrow_mut().fail = true;
        fx.stub(
            "f",
            ":name \"f\"\n:returns void\n:output vec4 FragColor\nSHADER { FragColor = vec4(0.0); }\n",
        );
        fx.graph.update(fx.pass);
        assert_eq!(fx.compiler.borrow().calls, 2);
        assert_eq!(fx.pass_op().program().map(|p| p.handle), Some(1));
    }

    #[test]
    fn test_stub_slots_reject_other_node_kinds() {
        let mut fx = Fixture::new();
        let value = fx
            .graph
            .add_node(Box::new(StaticValueOp::new(Value::Float(1.0))));
        let err = fx
            .graph
            .connect(fx.pass, VERTEX_SLOT, Some(value))
            .unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
    }
}
