// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node identity and the behavior trait implemented by every node type.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::message::Message;
use crate::slot::SlotSpec;
use crate::value::{Value, ValueKind};

/// Handle to a node in a [`Graph`] arena.
///
/// Handles are generational: disposing a node bumps the generation of its
/// arena cell, so stale handles fail lookups instead of aliasing a newer
/// node that reused the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

/// Closed set of node categories.
///
/// Slot compatibility checks are decided on this tag alone, so every node
/// type declares exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A node producing a plain [`Value`].
    Value(ValueKind),
    /// A shader stub: one GLSL function plus its interface metadata.
    Stub,
    /// A texture resource.
    Texture,
    /// A GPU buffer resource.
    Buffer,
    /// A render pass combining a vertex and a fragment stub.
    Pass,
    /// A material grouping render passes.
    Material,
}

/// Context handed to [`NodeOp`] hooks.
///
/// While a hook runs, the node's op is temporarily taken out of the arena,
/// so the op has exclusive access to itself and the context has exclusive
/// access to the rest of the graph.
pub struct OpCtx<'a> {
    /// The graph the node lives in.
    pub graph: &'a mut Graph,
    /// The node the hook runs for.
    pub node: NodeId,
}

/// Behavior of a node type.
///
/// The graph owns all structure (slots, connections, dirty flags); an op
/// only holds the node's private state and reacts to `operate` and
/// `handle_message` calls.
pub trait NodeOp: Any {
    /// The category this node belongs to.
    fn kind(&self) -> NodeKind;

    /// Slots to create when the node is added to a graph.
    fn initial_slots(&self) -> Vec<SlotSpec> {
        Vec::new()
    }

    /// The value this node produces, if it is a value source.
    fn value(&self) -> Option<Value> {
        None
    }

    /// Recomputes the node's outputs from its inputs.
    ///
    /// Called by [`Graph::update`](crate::graph::Graph::update) after all
    /// dependencies are up to date. Must not panic on bad input; failures
    /// are logged and the previous outputs are kept.
    fn operate(&mut self, ctx: &mut OpCtx<'_>);

    /// Reacts to a message delivered to this node.
    ///
    /// The graph has already applied the dirty-flag transition before this
    /// hook runs; most ops only override this to react eagerly to specific
    /// slots.
    fn handle_message(&mut self, ctx: &mut OpCtx<'_>, message: &Message) {
        let _ = (ctx, message);
    }

    /// Upcast for downcasting to the concrete op type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete op type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Value(kind) => write!(f, "value({kind:?})"),
            NodeKind::Stub => write!(f, "stub"),
            NodeKind::Texture => write!(f, "texture"),
            NodeKind::Buffer => write!(f, "buffer"),
            NodeKind::Pass => write!(f, "pass"),
            NodeKind::Material => write!(f, "material"),
        }
    }
}
