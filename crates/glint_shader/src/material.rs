// SPDX-License-Identifier: MIT OR Apache-2.0
//! The material node, a bundle of render passes.

use std::any::Any;

use glint_graph::{Graph, NodeId, NodeKind, NodeOp, OpCtx, SlotKind, SlotSpec};

/// Name of the slot holding the main color pass.
pub const SOLID_SLOT: &str = "solid";
/// Name of the slot holding the shadow map pass.
pub const SHADOW_SLOT: &str = "shadow";

/// A node grouping the passes a mesh is drawn with. Updating a material
/// updates every connected pass, so the renderer can pull one node and
/// get fresh programs for the whole bundle.
#[derive(Debug, Default)]
pub struct MaterialOp;

impl MaterialOp {
    /// Creates a material with no passes connected.
    pub fn new() -> Self {
        Self
    }

    /// The pass drawing into the color targets, if connected.
    pub fn solid_pass(graph: &Graph, node: NodeId) -> Option<NodeId> {
        graph.referenced_node(node, SOLID_SLOT)
    }

    /// The pass drawing into the shadow map, if connected.
    pub fn shadow_pass(graph: &Graph, node: NodeId) -> Option<NodeId> {
        graph.referenced_node(node, SHADOW_SLOT)
    }
}

impl NodeOp for MaterialOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Material
    }

    fn initial_slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::new(SOLID_SLOT, SlotKind::Pass),
            SlotSpec::new(SHADOW_SLOT, SlotKind::Pass),
        ]
    }

    fn operate(&mut self, _ctx: &mut OpCtx<'_>) {
        // passes are refreshed by the dependency walk before this runs
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
