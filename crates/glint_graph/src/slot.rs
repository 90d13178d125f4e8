// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slots: the typed connection points owned by nodes.

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeKind};
use crate::value::{Value, ValueKind};

/// Stable identity of a slot, preserved across slot-list rebuilds.
///
/// When a stub node regenerates its slots from new source, slots that are
/// carried over keep their `SlotId`, which lets editors keep selection and
/// layout state attached to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub(crate) u64);

/// A `(node, slot name)` pair, used in reverse-dependency lists and in
/// messages that concern a specific slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// The node owning the slot.
    pub node: NodeId,
    /// The slot's name on that node.
    pub slot: String,
}

/// What a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// A value node of exactly this kind.
    Value(ValueKind),
    /// A value node of this kind, or a stub whose function returns it.
    ValueOrStub(ValueKind),
    /// A texture node.
    Texture,
    /// A buffer node.
    Buffer,
    /// A stub node.
    Stub,
    /// A pass node.
    Pass,
    /// A material node.
    Material,
    /// Any node at all.
    Any,
}

impl SlotKind {
    /// Whether a node of `kind` may be connected to a slot of this kind.
    pub fn accepts(self, kind: NodeKind) -> bool {
        match self {
            SlotKind::Value(v) => kind == NodeKind::Value(v),
            SlotKind::ValueOrStub(v) => kind == NodeKind::Value(v) || kind == NodeKind::Stub,
            SlotKind::Texture => kind == NodeKind::Texture,
            SlotKind::Buffer => kind == NodeKind::Buffer,
            SlotKind::Stub => kind == NodeKind::Stub,
            SlotKind::Pass => kind == NodeKind::Pass,
            SlotKind::Material => kind == NodeKind::Material,
            SlotKind::Any => true,
        }
    }

    /// The value kind this slot carries, if it is a value slot.
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            SlotKind::Value(v) | SlotKind::ValueOrStub(v) => Some(v),
            _ => None,
        }
    }
}

/// The connection state of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotConnection {
    /// At most one connected node. `None` means the slot falls back to its
    /// default node, if it has one.
    Single(Option<NodeId>),
    /// An ordered list of connected nodes.
    Multi(Vec<NodeId>),
}

/// Description of a slot, used when creating nodes and when stub nodes
/// regenerate their slot lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    /// Slot name, unique per node.
    pub name: String,
    /// What the slot accepts.
    pub kind: SlotKind,
    /// Whether the slot holds an ordered list of connections.
    pub multi: bool,
    /// Whether the slot shows up in editors and default traversal.
    pub public: bool,
    /// Whether the slot's connection is written out when saving.
    pub serializable: bool,
    /// Whether hidden-inclusive traversal follows this slot.
    pub traversable: bool,
    /// Ghost slots are rendered detached in the editor.
    pub ghost: bool,
    /// Initial value of the slot's default node. Only meaningful for value
    /// slots; `None` picks the kind's zero value.
    pub default: Option<Value>,
}

impl SlotSpec {
    /// A public, serializable, traversable single slot.
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            name: name.into(),
            kind,
            multi: false,
            public: true,
            serializable: true,
            traversable: true,
            ghost: false,
            default: None,
        }
    }

    /// Makes the slot hold an ordered list of connections.
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Hides the slot from editors and default traversal.
    pub fn hidden(mut self) -> Self {
        self.public = false;
        self
    }

    /// Excludes the slot's connection from saving.
    pub fn transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Excludes the slot from hidden-inclusive traversal.
    pub fn untraversable(mut self) -> Self {
        self.traversable = false;
        self
    }

    /// Marks the slot as a ghost.
    pub fn ghost(mut self) -> Self {
        self.ghost = true;
        self
    }

    /// Sets the initial default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A slot owned by a node.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Stable identity across slot-list rebuilds.
    pub id: SlotId,
    /// Slot name, unique per node.
    pub name: String,
    /// What the slot accepts.
    pub kind: SlotKind,
    /// Current connection state.
    pub connection: SlotConnection,
    /// Hidden node supplying the default value, for value slots.
    pub default_node: Option<NodeId>,
    /// Whether the slot shows up in editors and default traversal.
    pub public: bool,
    /// Whether the slot's connection is written out when saving.
    pub serializable: bool,
    /// Whether hidden-inclusive traversal follows this slot.
    pub traversable: bool,
    /// Ghost slots are rendered detached in the editor.
    pub ghost: bool,
}

impl Slot {
    /// Whether the slot is a multi slot.
    pub fn is_multi(&self) -> bool {
        matches!(self.connection, SlotConnection::Multi(_))
    }

    /// Whether a single slot has no explicit connection and falls back to
    /// its default node. Multi slots are never defaulted.
    pub fn is_defaulted(&self) -> bool {
        matches!(self.connection, SlotConnection::Single(None))
    }

    /// The node this slot reads from: the explicit connection if present,
    /// the default node otherwise. `None` for multi slots.
    pub fn referenced_node(&self) -> Option<NodeId> {
        match &self.connection {
            SlotConnection::Single(target) => target.or(self.default_node),
            SlotConnection::Multi(_) => None,
        }
    }

    /// The ordered connections of a multi slot. Empty for single slots.
    pub fn multi_nodes(&self) -> &[NodeId] {
        match &self.connection {
            SlotConnection::Multi(nodes) => nodes,
            SlotConnection::Single(_) => &[],
        }
    }

    /// Whether `spec` describes a slot this one can be carried over as
    /// during a slot-list rebuild.
    pub(crate) fn matches_spec(&self, spec: &SlotSpec) -> bool {
        self.name == spec.name && self.kind == spec.kind && self.is_multi() == spec.multi
    }
}

/// Saved form of a slot's connection, produced for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Slot name.
    pub name: String,
    /// Explicit single connection, if any.
    pub target: Option<NodeId>,
    /// Ordered multi connections.
    pub multi_targets: Vec<NodeId>,
    /// Default value, for defaulted value slots.
    pub default: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_slot_accepts_matching_kind_only() {
        let slot = SlotKind::Value(ValueKind::Float);
        assert!(slot.accepts(NodeKind::Value(ValueKind::Float)));
        assert!(!slot.accepts(NodeKind::Value(ValueKind::Vec3)));
        assert!(!slot.accepts(NodeKind::Stub));
    }

    #[test]
    fn test_value_or_stub_accepts_stubs() {
        let slot = SlotKind::ValueOrStub(ValueKind::Vec4);
        assert!(slot.accepts(NodeKind::Stub));
        assert!(slot.accepts(NodeKind::Value(ValueKind::Vec4)));
        assert!(!slot.accepts(NodeKind::Texture));
    }

    #[test]
    fn test_any_accepts_everything() {
        for kind in [
            NodeKind::Stub,
            NodeKind::Texture,
            NodeKind::Buffer,
            NodeKind::Pass,
            NodeKind::Material,
            NodeKind::Value(ValueKind::Mat4),
        ] {
            assert!(SlotKind::Any.accepts(kind));
        }
    }
}
