// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named registry of stub nodes, including the builtin uber stub.

use glint_graph::{Graph, NodeId, Value};
use indexmap::IndexMap;
use tracing::error;

use crate::stub::{StubOp, SOURCE_SLOT};

/// Source of the uber stub prepended to every built shader stage. It
/// returns void and only contributes shared helper functions, so its
/// body compiles to an empty function.
const UBER_SOURCE: &str = r#":name "uber"
:returns void

const float PI = 3.14159265358979;

float saturate1(float x) {
  return clamp(x, 0.0, 1.0);
}

vec3 srgbToLinear(vec3 color) {
  return pow(color, vec3(2.2));
}

vec3 linearToSrgb(vec3 color) {
  return pow(color, vec3(1.0 / 2.2));
}

SHADER
{
}
"#;

/// Stub nodes addressable by name.
///
/// The library owns no graph; it only remembers which node carries
/// each named stub. Setting a source for an existing name updates the
/// node in place, so everything connected to it follows the new
/// interface.
#[derive(Debug)]
pub struct StubLibrary {
    stubs: IndexMap<String, NodeId>,
    uber: NodeId,
}

impl StubLibrary {
    /// Creates a library holding only the uber stub.
    pub fn new(graph: &mut Graph) -> Self {
        let uber = graph.add_node(Box::new(StubOp::new()));
        let mut stubs = IndexMap::new();
        stubs.insert("uber".to_owned(), uber);
        Self::apply_source(graph, uber, UBER_SOURCE);
        Self { stubs, uber }
    }

    /// Sets the source of the named stub, creating its node on first
    /// use. Returns the stub's node id.
    pub fn set_stub_source(&mut self, graph: &mut Graph, name: &str, source: &str) -> NodeId {
        let node = match self.stubs.get(name) {
            Some(node) => *node,
            None => {
                let node = graph.add_node(Box::new(StubOp::new()));
                self.stubs.insert(name.to_owned(), node);
                node
            }
        };
        Self::apply_source(graph, node, source);
        node
    }

    /// Looks up a stub node by name.
    pub fn stub(&self, name: &str) -> Option<NodeId> {
        self.stubs.get(name).copied()
    }

    /// The uber stub shared by all built shaders.
    pub fn uber(&self) -> NodeId {
        self.uber
    }

    /// Registered stub names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stubs.keys().map(String::as_str)
    }

    fn apply_source(graph: &mut Graph, node: NodeId, source: &str) {
        if let Err(err) = graph.set_slot_default(node, SOURCE_SLOT, Value::Text(source.to_owned()))
        {
            error!(%node, %err, "failed to store stub source");
            return;
        }
        graph.update(node);
    }
}
