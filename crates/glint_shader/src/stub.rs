// SPDX-License-Identifier: MIT OR Apache-2.0
//! The stub node: GLSL source in, parameter slots out.

use std::any::Any;
use std::rc::Rc;

use tracing::error;

use glint_graph::{
    Message, MessageKind, NodeKind, NodeOp, OpCtx, SlotKind, SlotSpec, Value, ValueKind,
};

use crate::analyzer::{ParamType, StubMetadata};

/// Name of the hidden slot holding the stub's source text.
pub const SOURCE_SLOT: &str = "source";

/// A node wrapping one shader stub.
///
/// Whenever the source changes, the node re-analyzes it and rebuilds its
/// public slots to match the declared parameters. Slots whose name and
/// kind are unchanged are carried over with their connections, so small
/// source edits never sever existing wiring. If the new source fails
/// analysis the previous metadata and slots stay in place.
#[derive(Debug, Default)]
pub struct StubOp {
    metadata: Option<Rc<StubMetadata>>,
    analyzed_source: Option<String>,
}

impl StubOp {
    /// Creates a stub node op with no metadata yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The metadata of the last successfully analyzed source.
    pub fn metadata(&self) -> Option<&Rc<StubMetadata>> {
        self.metadata.as_ref()
    }

    /// Re-analyzes the current source if it changed, rebuilding the
    /// parameter slots on success.
    fn refresh(&mut self, ctx: &mut OpCtx<'_>) {
        let source = match ctx.graph.slot_value(ctx.node, SOURCE_SLOT) {
            Some(Value::Text(text)) => text,
            _ => return,
        };
        if self.analyzed_source.as_deref() == Some(source.as_str()) {
            return;
        }
        match StubMetadata::from_text(&source) {
            Ok(meta) => {
                let specs = param_slot_specs(&meta);
                if let Err(err) = ctx.graph.rebuild_public_slots(ctx.node, &specs) {
                    error!(node = %ctx.node, %err, "failed to rebuild stub slots");
                    return;
                }
                ctx.graph.set_name(ctx.node, meta.name.clone());
                self.metadata = Some(Rc::new(meta));
                self.analyzed_source = Some(source);
            }
            Err(err) => {
                error!(node = %ctx.node, %err, "stub source rejected, keeping previous interface");
            }
        }
    }
}

/// Slot descriptions for a stub's parameters. Value parameters accept a
/// stub or a same-typed value node and carry a default; texture and
/// buffer parameters must be connected explicitly.
fn param_slot_specs(meta: &StubMetadata) -> Vec<SlotSpec> {
    meta.parameters
        .iter()
        .filter_map(|param| {
            let kind = match param.ty {
                ParamType::Sampler2D | ParamType::Image2D => SlotKind::Texture,
                ParamType::Buffer => SlotKind::Buffer,
                other => SlotKind::ValueOrStub(other.value_kind()?),
            };
            Some(SlotSpec::new(param.name.clone(), kind))
        })
        .collect()
}

impl NodeOp for StubOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Stub
    }

    fn initial_slots(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new(SOURCE_SLOT, SlotKind::Value(ValueKind::Text)).hidden()]
    }

    fn operate(&mut self, ctx: &mut OpCtx<'_>) {
        self.refresh(ctx);
    }

    fn handle_message(&mut self, ctx: &mut OpCtx<'_>, message: &Message) {
        let about_source = message
            .slot
            .as_ref()
            .is_some_and(|slot_ref| slot_ref.slot == SOURCE_SLOT);
        if about_source
            && matches!(
                message.kind,
                MessageKind::ValueChanged | MessageKind::SlotConnectionChanged
            )
        {
            // regenerate slots eagerly so editors see the new interface
            self.refresh(ctx);
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
    use glint_graph::{Graph, NodeId, StaticValueOp};

    fn stub_with_source(graph: &mut Graph, source: &str) -> NodeId {
        let stub = graph.add_node(Box::new(StubOp::new()));
        set_source(graph, stub, source);
        stub
    }

    fn set_source(graph: &mut Graph, stub: NodeId, source: &str) {
        graph
            .set_slot_default(stub, SOURCE_SLOT, Value::Text(source.to_owned()))
            .unwrap();
        graph.update(stub);
    }

    #[test]
    fn test_parameters_become_slots() {
        let mut graph = Graph::new();
        let stub = stub_with_source(
            &mut graph,
            ":name \"glow\"\n:param float amount\n:param sampler2D image\n:param buffer points\nSHADER { }\n",
        );
        assert_eq!(
            graph.slot(stub, "amount").unwrap().kind,
            SlotKind::ValueOrStub(ValueKind::Float)
        );
        assert_eq!(graph.slot(stub, "image").unwrap().kind, SlotKind::Texture);
        assert_eq!(graph.slot(stub, "points").unwrap().kind, SlotKind::Buffer);
        assert!(!graph.slot(stub, SOURCE_SLOT).unwrap().public);
        assert_eq!(graph.name(stub), "glow");
    }

    #[test]
    fn test_identical_source_keeps_slot_identity() {
        let mut graph = Graph::new();
        let source = ":name \"s\"\n:param float foo\nSHADER { }\n";
        let stub = stub_with_source(&mut graph, source);
        let target = graph.add_node(Box::new(StaticValueOp::new(Value::Float(1.0))));
        graph.connect(stub, "foo", Some(target)).unwrap();
        let slot_id = graph.slot(stub, "foo").unwrap().id;

        set_source(&mut graph, stub, source);
        assert_eq!(graph.slot(stub, "foo").unwrap().id, slot_id);
        assert_eq!(graph.referenced_node(stub, "foo"), Some(target));
    }

    #[test]
    fn test_comment_edit_keeps_wiring() {
        let mut graph = Graph::new();
        let stub = stub_with_source(&mut graph, ":name \"s\"\n:param float foo\nSHADER { }\n");
        let target = graph.add_node(Box::new(StaticValueOp::new(Value::Float(1.0))));
        graph.connect(stub, "foo", Some(target)).unwrap();
        let slot_id = graph.slot(stub, "foo").unwrap().id;

        set_source(
            &mut graph,
            stub,
            ":name \"s\"\n:param float foo\n// tweaked\nSHADER { }\n",
        );
        assert_eq!(graph.slot(stub, "foo").unwrap().id, slot_id);
        assert_eq!(graph.referenced_node(stub, "foo"), Some(target));
    }

    #[test]
    fn test_type_change_replaces_slot() {
        let mut graph = Graph::new();
        let stub = stub_with_source(&mut graph, ":name \"s\"\n:param float foo\nSHADER { }\n");
        let target = graph.add_node(Box::new(StaticValueOp::new(Value::Float(1.0))));
        graph.connect(stub, "foo", Some(target)).unwrap();
        let slot_id = graph.slot(stub, "foo").unwrap().id;

        set_source(&mut graph, stub, ":name \"s\"\n:param vec3 foo\nSHADER { }\n");
        let replaced = graph.slot(stub, "foo").unwrap();
        assert_ne!(replaced.id, slot_id);
        assert_eq!(replaced.kind, SlotKind::ValueOrStub(ValueKind::Vec3));
        assert!(graph.is_defaulted(stub, "foo"));
    }

    #[test]
    fn test_dropped_parameter_deletes_slot() {
        let mut graph = Graph::new();
        let stub = stub_with_source(
            &mut graph,
            ":name \"s\"\n:param float foo\n:param float bar\nSHADER { }\n",
        );
        set_source(&mut graph, stub, ":name \"s\"\n:param float bar\nSHADER { }\n");
        assert!(graph.slot(stub, "foo").is_none());
        assert!(graph.slot(stub, "bar").is_some());
    }

    #[test]
    fn test_unparsable_source_keeps_previous_interface() {
        let mut graph = Graph::new();
        let stub = stub_with_source(&mut graph, ":name \"s\"\n:param float foo\nSHADER { }\n");
        let old_meta = graph.op_as::<StubOp>(stub).unwrap().metadata().cloned();
        assert!(old_meta.is_some());

        // no :name directive, analysis fails
        set_source(&mut graph, stub, ":param vec2 other\nSHADER { }\n");
        assert!(graph.slot(stub, "foo").is_some());
        assert!(graph.slot(stub, "other").is_none());
        let kept = graph.op_as::<StubOp>(stub).unwrap().metadata().cloned();
        assert_eq!(kept.as_deref(), old_meta.as_deref());
    }

    #[test]
    fn test_value_param_accepts_stub_connection() {
        let mut graph = Graph::new();
        let consumer = stub_with_source(
            &mut graph,
            ":name \"consumer\"\n:param vec4 color\nSHADER { }\n",
        );
        let producer = stub_with_source(
            &mut graph,
            ":name \"producer\"\n:returns vec4\nSHADER { return vec4(1.0); }\n",
        );
        graph.connect(consumer, "color", Some(producer)).unwrap();
        assert_eq!(graph.referenced_node(consumer, "color"), Some(producer));
    }
}
