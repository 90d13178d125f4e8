// SPDX-License-Identifier: MIT OR Apache-2.0
//! The node arena and all structural operations on it.

use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::message::{Message, MessageKind};
use crate::node::{NodeId, NodeKind, NodeOp, OpCtx};
use crate::slot::{Slot, SlotConnection, SlotId, SlotKind, SlotRef, SlotSnapshot, SlotSpec};
use crate::value::{StaticValueOp, Value, ValueKind};
use crate::watcher::Watcher;

/// Errors returned by structural graph operations.
///
/// Every failing operation leaves the graph unchanged.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Lookup with a stale or foreign handle.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    /// The named slot does not exist on the node.
    #[error("node {node} has no slot named `{slot}`")]
    UnknownSlot {
        /// The node that was addressed.
        node: NodeId,
        /// The missing slot name.
        slot: String,
    },
    /// The slot's kind does not accept the node's kind.
    #[error("slot `{slot}` of kind {expected:?} cannot accept a {actual} node")]
    TypeMismatch {
        /// The slot that rejected the connection.
        slot: String,
        /// What the slot accepts.
        expected: SlotKind,
        /// The kind of the offered node.
        actual: NodeKind,
    },
    /// The connection would make the graph cyclic.
    #[error("connecting {target} to `{slot}` on {owner} would create a cycle")]
    WouldCycle {
        /// The node owning the slot.
        owner: NodeId,
        /// The slot being connected.
        slot: String,
        /// The node that depends on `owner`.
        target: NodeId,
    },
    /// The node is already present in the multi slot.
    #[error("{target} is already connected to multi slot `{slot}`")]
    AlreadyConnected {
        /// The multi slot.
        slot: String,
        /// The duplicate node.
        target: NodeId,
    },
    /// The node is not present in the slot.
    #[error("{target} is not connected to slot `{slot}`")]
    NotConnected {
        /// The slot.
        slot: String,
        /// The absent node.
        target: NodeId,
    },
    /// Multi slots cannot be connected to nothing.
    #[error("multi slot `{slot}` requires a node to connect")]
    MissingTarget {
        /// The multi slot.
        slot: String,
    },
    /// Slot names are unique per node.
    #[error("node {node} already has a slot named `{slot}`")]
    DuplicateSlot {
        /// The node that was addressed.
        node: NodeId,
        /// The clashing slot name.
        slot: String,
    },
    /// Reorder index past the end of a multi slot.
    #[error("index {index} is out of range for multi slot `{slot}`")]
    IndexOutOfRange {
        /// The multi slot.
        slot: String,
        /// The rejected index.
        index: usize,
    },
    /// Value written into a node holding a different value kind.
    #[error("value of kind {actual:?} cannot replace a {expected:?} value")]
    ValueKindMismatch {
        /// The kind the node holds.
        expected: ValueKind,
        /// The kind that was offered.
        actual: ValueKind,
    },
    /// The node does not hold a settable value.
    #[error("node {0} is not a value node")]
    NotAValueNode(NodeId),
    /// The slot has no built-in default to write to.
    #[error("slot `{slot}` has no default value")]
    NoDefault {
        /// The slot.
        slot: String,
    },
}

struct NodePayload {
    kind: NodeKind,
    op: Option<Box<dyn NodeOp>>,
    name: String,
    position: [f32; 2],
    up_to_date: bool,
    slots: IndexMap<String, Slot>,
    dependants: Vec<SlotRef>,
    watchers: Vec<Weak<dyn Watcher>>,
}

struct Entry {
    generation: u32,
    payload: Option<NodePayload>,
}

/// Arena of nodes plus the message queue that keeps them consistent.
#[derive(Default)]
pub struct Graph {
    entries: Vec<Entry>,
    free: Vec<u32>,
    queue: IndexSet<Message>,
    draining: bool,
    next_slot_id: u64,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn payload(&self, id: NodeId) -> Option<&NodePayload> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.payload.as_ref()
    }

    fn payload_mut(&mut self, id: NodeId) -> Option<&mut NodePayload> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.payload.as_mut()
    }

    fn require(&self, id: NodeId) -> Result<&NodePayload, GraphError> {
        self.payload(id).ok_or(GraphError::UnknownNode(id))
    }

    fn require_mut(&mut self, id: NodeId) -> Result<&mut NodePayload, GraphError> {
        self.payload_mut(id).ok_or(GraphError::UnknownNode(id))
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.payload(id).is_some()
    }

    /// Number of live nodes, hidden default nodes included.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.payload.is_some()).count()
    }

    /// Whether the graph holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of all live nodes in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, e)| {
            e.payload.as_ref().map(|_| NodeId {
                index: index as u32,
                generation: e.generation,
            })
        })
    }

    // ---------------------------------------------------------------- nodes

    /// Adds a node to the graph and creates its initial slots.
    pub fn add_node(&mut self, op: Box<dyn NodeOp>) -> NodeId {
        let kind = op.kind();
        let specs = op.initial_slots();
        let id = self.allocate(NodePayload {
            kind,
            op: Some(op),
            name: String::new(),
            position: [0.0; 2],
            up_to_date: false,
            slots: IndexMap::new(),
            dependants: Vec::new(),
            watchers: Vec::new(),
        });
        for spec in specs {
            if let Err(err) = self.add_slot(id, spec) {
                error!(node = %id, %err, "failed to create initial slot");
            }
        }
        id
    }

    fn allocate(&mut self, payload: NodePayload) -> NodeId {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.payload = Some(payload);
            NodeId {
                index,
                generation: entry.generation,
            }
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                payload: Some(payload),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Removes a node: all connections to and from it are undone, its
    /// hidden default nodes are removed with it, and its handle goes
    /// stale. Value slots reading the node revert to their defaults.
    pub fn dispose(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        self.notify_watchers(node, |w| w.on_node_removed(node));
        let dependants = self
            .payload(node)
            .map(|p| p.dependants.clone())
            .unwrap_or_default();
        for slot_ref in dependants {
            let Some(slot) = self.slot(slot_ref.node, &slot_ref.slot) else {
                continue;
            };
            if slot.is_multi() {
                let _ = self.disconnect(slot_ref.node, &slot_ref.slot, node);
            } else if slot.default_node != Some(node) {
                let _ = self.connect(slot_ref.node, &slot_ref.slot, None);
            }
        }
        let slots: Vec<Slot> = self
            .payload_mut(node)
            .map(|p| std::mem::take(&mut p.slots))
            .unwrap_or_default()
            .into_values()
            .collect();
        for slot in &slots {
            self.release_slot(node, slot);
        }
        if let Some(entry) = self.entries.get_mut(node.index as usize) {
            if entry.generation == node.generation && entry.payload.is_some() {
                entry.payload = None;
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        debug!(node = %node, "disposed node");
    }

    /// The kind of a node.
    pub fn kind_of(&self, node: NodeId) -> Option<NodeKind> {
        self.payload(node).map(|p| p.kind)
    }

    /// Downcasts a node's op to a concrete type.
    pub fn op_as<T: NodeOp>(&self, node: NodeId) -> Option<&T> {
        self.payload(node)?.op.as_ref()?.as_any().downcast_ref()
    }

    /// Mutable downcast of a node's op to a concrete type.
    pub fn op_as_mut<T: NodeOp>(&mut self, node: NodeId) -> Option<&mut T> {
        self.payload_mut(node)?
            .op
            .as_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    // ---------------------------------------------------------------- slots

    /// Adds a slot to an existing node. Value slots get a hidden default
    /// node initialized from the spec.
    pub fn add_slot(&mut self, owner: NodeId, spec: SlotSpec) -> Result<SlotId, GraphError> {
        if self.require(owner)?.slots.contains_key(&spec.name) {
            return Err(GraphError::DuplicateSlot {
                node: owner,
                slot: spec.name,
            });
        }
        let public = spec.public;
        let slot = self.make_slot(owner, &spec);
        let id = slot.id;
        if let Some(p) = self.payload_mut(owner) {
            p.slots.insert(spec.name, slot);
        }
        if public {
            self.post(Message::new(MessageKind::SlotStructureChanged, owner));
        }
        Ok(id)
    }

    /// Builds a slot for `owner` from a spec, allocating its default node
    /// when the spec describes a single value slot.
    fn make_slot(&mut self, owner: NodeId, spec: &SlotSpec) -> Slot {
        let default_node = if spec.multi {
            None
        } else {
            spec.kind.value_kind().map(|kind| {
                let value = spec.default.clone().unwrap_or_else(|| Value::zero(kind));
                let id = self.add_node(Box::new(StaticValueOp::new(value)));
                if let Some(p) = self.payload_mut(id) {
                    p.dependants.push(SlotRef {
                        node: owner,
                        slot: spec.name.clone(),
                    });
                    p.up_to_date = true;
                }
                id
            })
        };
        let id = SlotId(self.next_slot_id);
        self.next_slot_id += 1;
        Slot {
            id,
            name: spec.name.clone(),
            kind: spec.kind,
            connection: if spec.multi {
                SlotConnection::Multi(Vec::new())
            } else {
                SlotConnection::Single(None)
            },
            default_node,
            public: spec.public,
            serializable: spec.serializable,
            traversable: spec.traversable,
            ghost: spec.ghost,
        }
    }

    /// Undoes a slot's edges and retires its default node. The slot must
    /// already be detached from its owner's slot map.
    fn release_slot(&mut self, owner: NodeId, slot: &Slot) {
        match &slot.connection {
            SlotConnection::Multi(list) => {
                for target in list.clone() {
                    self.remove_dependant(target, owner, &slot.name);
                }
            }
            SlotConnection::Single(target) => {
                if let Some(node) = target.or(slot.default_node) {
                    self.remove_dependant(node, owner, &slot.name);
                }
            }
        }
        if let Some(default) = slot.default_node {
            self.dispose(default);
        }
    }

    fn remove_dependant(&mut self, node: NodeId, owner: NodeId, slot: &str) {
        if let Some(p) = self.payload_mut(node) {
            if let Some(pos) = p
                .dependants
                .iter()
                .position(|r| r.node == owner && r.slot == slot)
            {
                p.dependants.remove(pos);
            }
        }
    }

    /// A slot by name.
    pub fn slot(&self, owner: NodeId, name: &str) -> Option<&Slot> {
        self.payload(owner)?.slots.get(name)
    }

    fn slot_mut(&mut self, owner: NodeId, name: &str) -> Option<&mut Slot> {
        self.payload_mut(owner)?.slots.get_mut(name)
    }

    /// All slots of a node in declaration order.
    pub fn slots(&self, owner: NodeId) -> impl Iterator<Item = &Slot> {
        self.payload(owner)
            .into_iter()
            .flat_map(|p| p.slots.values())
    }

    /// The node a single slot reads from: its connection, or its default
    /// node when nothing is connected.
    pub fn referenced_node(&self, owner: NodeId, slot: &str) -> Option<NodeId> {
        self.slot(owner, slot)?.referenced_node()
    }

    /// The ordered connections of a multi slot.
    pub fn multi_nodes(&self, owner: NodeId, slot: &str) -> &[NodeId] {
        self.slot(owner, slot).map(Slot::multi_nodes).unwrap_or(&[])
    }

    /// The value read through a single slot.
    pub fn slot_value(&self, owner: NodeId, slot: &str) -> Option<Value> {
        self.value_of(self.referenced_node(owner, slot)?)
    }

    /// Whether a single slot falls back to its default node.
    pub fn is_defaulted(&self, owner: NodeId, slot: &str) -> bool {
        self.slot(owner, slot).is_some_and(Slot::is_defaulted)
    }

    /// Saved form of a node's serializable slots.
    pub fn slot_snapshots(&self, node: NodeId) -> Vec<SlotSnapshot> {
        self.payload(node)
            .map(|p| {
                p.slots
                    .values()
                    .filter(|s| s.serializable)
                    .map(|s| SlotSnapshot {
                        name: s.name.clone(),
                        target: match &s.connection {
                            SlotConnection::Single(t) => *t,
                            SlotConnection::Multi(_) => None,
                        },
                        multi_targets: s.multi_nodes().to_vec(),
                        default: s.default_node.and_then(|d| self.value_of(d)),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces a node's public slots with `specs`, carrying over slots
    /// whose name, kind and arity are unchanged. Carried-over slots keep
    /// their [`SlotId`], connection and default node. Non-public slots
    /// are untouched and stay ahead of the rebuilt list.
    pub fn rebuild_public_slots(
        &mut self,
        owner: NodeId,
        specs: &[SlotSpec],
    ) -> Result<(), GraphError> {
        let old = {
            let p = self.require_mut(owner)?;
            std::mem::take(&mut p.slots)
        };
        let mut rebuilt: IndexMap<String, Slot> = IndexMap::new();
        let mut public_old: IndexMap<String, Slot> = IndexMap::new();
        for (name, slot) in old {
            if slot.public {
                public_old.insert(name, slot);
            } else {
                rebuilt.insert(name, slot);
            }
        }
        for spec in specs {
            if rebuilt.contains_key(&spec.name) {
                warn!(node = %owner, slot = %spec.name, "duplicate slot name in rebuild");
                continue;
            }
            let slot = match public_old.shift_remove(&spec.name) {
                Some(existing) if existing.matches_spec(spec) => existing,
                Some(stale) => {
                    self.release_slot(owner, &stale);
                    self.make_slot(owner, spec)
                }
                None => self.make_slot(owner, spec),
            };
            rebuilt.insert(spec.name.clone(), slot);
        }
        for (_, stale) in public_old {
            self.release_slot(owner, &stale);
        }
        if let Some(p) = self.payload_mut(owner) {
            p.slots = rebuilt;
        }
        self.post(Message::new(MessageKind::SlotStructureChanged, owner));
        Ok(())
    }

    // ---------------------------------------------------------- connections

    /// Connects `target` to a single slot, or clears the slot when
    /// `target` is `None`. Rejected connections leave the graph unchanged.
    pub fn connect(
        &mut self,
        owner: NodeId,
        slot: &str,
        target: Option<NodeId>,
    ) -> Result<(), GraphError> {
        let (kind, multi) = {
            let p = self.require(owner)?;
            let s = p.slots.get(slot).ok_or_else(|| GraphError::UnknownSlot {
                node: owner,
                slot: slot.to_owned(),
            })?;
            (s.kind, s.is_multi())
        };
        if let Some(t) = target {
            let target_kind = self.require(t)?.kind;
            if !kind.accepts(target_kind) {
                error!(node = %owner, slot, target = %t, "connection rejected: incompatible kinds");
                return Err(GraphError::TypeMismatch {
                    slot: slot.to_owned(),
                    expected: kind,
                    actual: target_kind,
                });
            }
            if t == owner || self.depends_on(t, owner) {
                error!(node = %owner, slot, target = %t, "connection rejected: would create a cycle");
                return Err(GraphError::WouldCycle {
                    owner,
                    slot: slot.to_owned(),
                    target: t,
                });
            }
        }
        if multi {
            let Some(t) = target else {
                return Err(GraphError::MissingTarget {
                    slot: slot.to_owned(),
                });
            };
            if let Some(s) = self.slot_mut(owner, slot) {
                if let SlotConnection::Multi(list) = &mut s.connection {
                    if list.contains(&t) {
                        return Err(GraphError::AlreadyConnected {
                            slot: slot.to_owned(),
                            target: t,
                        });
                    }
                    list.push(t);
                }
            }
            if let Some(p) = self.payload_mut(t) {
                p.dependants.push(SlotRef {
                    node: owner,
                    slot: slot.to_owned(),
                });
            }
            self.post(Message::for_slot(
                MessageKind::MultiSlotConnectionAdded,
                Some(t),
                SlotRef {
                    node: owner,
                    slot: slot.to_owned(),
                },
            ));
            return Ok(());
        }
        let (current, old_effective, default_node) = {
            // slot presence was just checked
            let Some(s) = self.slot(owner, slot) else {
                return Ok(());
            };
            let current = match &s.connection {
                SlotConnection::Single(t) => *t,
                SlotConnection::Multi(_) => None,
            };
            (current, s.referenced_node(), s.default_node)
        };
        if current == target {
            return Ok(());
        }
        if let Some(old) = old_effective {
            self.remove_dependant(old, owner, slot);
        }
        if let Some(new) = target.or(default_node) {
            if let Some(p) = self.payload_mut(new) {
                p.dependants.push(SlotRef {
                    node: owner,
                    slot: slot.to_owned(),
                });
            }
        }
        if let Some(s) = self.slot_mut(owner, slot) {
            s.connection = SlotConnection::Single(target);
        }
        self.post(Message::for_slot(
            MessageKind::SlotConnectionChanged,
            target,
            SlotRef {
                node: owner,
                slot: slot.to_owned(),
            },
        ));
        Ok(())
    }

    /// Removes `target` from a slot. On single slots this is equivalent
    /// to connecting `None` when `target` is the current connection.
    pub fn disconnect(
        &mut self,
        owner: NodeId,
        slot: &str,
        target: NodeId,
    ) -> Result<(), GraphError> {
        let is_multi = {
            let p = self.require(owner)?;
            let s = p.slots.get(slot).ok_or_else(|| GraphError::UnknownSlot {
                node: owner,
                slot: slot.to_owned(),
            })?;
            s.is_multi()
        };
        if is_multi {
            let removed = match self.slot_mut(owner, slot) {
                Some(s) => {
                    if let SlotConnection::Multi(list) = &mut s.connection {
                        match list.iter().position(|n| *n == target) {
                            Some(pos) => {
                                list.remove(pos);
                                true
                            }
                            None => false,
                        }
                    } else {
                        false
                    }
                }
                None => false,
            };
            if !removed {
                return Err(GraphError::NotConnected {
                    slot: slot.to_owned(),
                    target,
                });
            }
            self.remove_dependant(target, owner, slot);
            self.post(Message::for_slot(
                MessageKind::MultiSlotConnectionRemoved,
                Some(target),
                SlotRef {
                    node: owner,
                    slot: slot.to_owned(),
                },
            ));
            return Ok(());
        }
        let current = match &self.slot(owner, slot).map(|s| s.connection.clone()) {
            Some(SlotConnection::Single(t)) => *t,
            _ => None,
        };
        if current != Some(target) {
            return Err(GraphError::NotConnected {
                slot: slot.to_owned(),
                target,
            });
        }
        self.connect(owner, slot, None)
    }

    /// Empties a multi slot, or clears a single slot back to its default.
    pub fn disconnect_all(&mut self, owner: NodeId, slot: &str) -> Result<(), GraphError> {
        let is_multi = {
            let p = self.require(owner)?;
            let s = p.slots.get(slot).ok_or_else(|| GraphError::UnknownSlot {
                node: owner,
                slot: slot.to_owned(),
            })?;
            s.is_multi()
        };
        if !is_multi {
            return self.connect(owner, slot, None);
        }
        let removed = match self.slot_mut(owner, slot) {
            Some(s) => {
                if let SlotConnection::Multi(list) = &mut s.connection {
                    std::mem::take(list)
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        };
        for target in removed {
            self.remove_dependant(target, owner, slot);
        }
        self.post(Message::for_slot(
            MessageKind::MultiSlotCleared,
            None,
            SlotRef {
                node: owner,
                slot: slot.to_owned(),
            },
        ));
        Ok(())
    }

    /// Moves an existing multi connection to `index`, shifting the rest.
    /// Posts a connection change because consumers depend on the order.
    pub fn move_multi_connection(
        &mut self,
        owner: NodeId,
        slot: &str,
        target: NodeId,
        index: usize,
    ) -> Result<(), GraphError> {
        self.require(owner)?;
        let Some(s) = self.slot_mut(owner, slot) else {
            return Err(GraphError::UnknownSlot {
                node: owner,
                slot: slot.to_owned(),
            });
        };
        let SlotConnection::Multi(list) = &mut s.connection else {
            return Err(GraphError::NotConnected {
                slot: slot.to_owned(),
                target,
            });
        };
        let Some(pos) = list.iter().position(|n| *n == target) else {
            return Err(GraphError::NotConnected {
                slot: slot.to_owned(),
                target,
            });
        };
        if index >= list.len() {
            return Err(GraphError::IndexOutOfRange {
                slot: slot.to_owned(),
                index,
            });
        }
        list.remove(pos);
        list.insert(index, target);
        self.post(Message::for_slot(
            MessageKind::SlotConnectionChanged,
            Some(target),
            SlotRef {
                node: owner,
                slot: slot.to_owned(),
            },
        ));
        Ok(())
    }

    /// Whether `from` transitively reads from `needle` through explicit
    /// connections.
    fn depends_on(&self, from: NodeId, needle: NodeId) -> bool {
        let mut visited = IndexSet::new();
        self.depends_on_inner(from, needle, &mut visited)
    }

    fn depends_on_inner(
        &self,
        from: NodeId,
        needle: NodeId,
        visited: &mut IndexSet<NodeId>,
    ) -> bool {
        if from == needle {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        let Some(p) = self.payload(from) else {
            return false;
        };
        for slot in p.slots.values() {
            match &slot.connection {
                SlotConnection::Multi(list) => {
                    if list
                        .iter()
                        .any(|n| self.depends_on_inner(*n, needle, visited))
                    {
                        return true;
                    }
                }
                SlotConnection::Single(Some(t)) => {
                    if self.depends_on_inner(*t, needle, visited) {
                        return true;
                    }
                }
                SlotConnection::Single(None) => {}
            }
        }
        false
    }

    // --------------------------------------------------------------- values

    /// The value a node produces, if it is a value source.
    pub fn value_of(&self, node: NodeId) -> Option<Value> {
        self.payload(node)?.op.as_ref()?.value()
    }

    /// Replaces the value held by a value node and notifies everything
    /// reading it.
    pub fn set_value(&mut self, node: NodeId, value: Value) -> Result<(), GraphError> {
        let p = self.require_mut(node)?;
        let Some(op) = p.op.as_mut() else {
            return Err(GraphError::NotAValueNode(node));
        };
        let Some(static_value) = op.as_any_mut().downcast_mut::<StaticValueOp>() else {
            return Err(GraphError::NotAValueNode(node));
        };
        let expected = static_value.get().kind();
        if expected != value.kind() {
            return Err(GraphError::ValueKindMismatch {
                expected,
                actual: value.kind(),
            });
        }
        static_value.set(value);
        let dependants = p.dependants.clone();
        for slot_ref in dependants {
            self.post(Message::for_slot(
                MessageKind::ValueChanged,
                Some(node),
                slot_ref,
            ));
        }
        Ok(())
    }

    /// Writes a defaulted value slot's built-in default.
    pub fn set_slot_default(
        &mut self,
        owner: NodeId,
        slot: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        let default = self
            .require(owner)?
            .slots
            .get(slot)
            .ok_or_else(|| GraphError::UnknownSlot {
                node: owner,
                slot: slot.to_owned(),
            })?
            .default_node
            .ok_or_else(|| GraphError::NoDefault {
                slot: slot.to_owned(),
            })?;
        self.set_value(default, value)
    }

    // ----------------------------------------------------------- evaluation

    /// Whether the node's cached outputs are current.
    pub fn is_up_to_date(&self, node: NodeId) -> bool {
        self.payload(node).is_some_and(|p| p.up_to_date)
    }

    /// Marks a node dirty and tells its dependants their inputs changed.
    /// Already-dirty nodes stop the cascade.
    pub fn invalidate(&mut self, node: NodeId) {
        let Some(p) = self.payload_mut(node) else {
            return;
        };
        if !p.up_to_date {
            return;
        }
        p.up_to_date = false;
        let dependants = p.dependants.clone();
        for slot_ref in dependants {
            self.post(Message::for_slot(
                MessageKind::ValueChanged,
                Some(node),
                slot_ref,
            ));
        }
    }

    /// Brings a node up to date: updates every dependency first, then runs
    /// the node's op once. Up-to-date nodes return immediately.
    pub fn update(&mut self, node: NodeId) {
        let Some(p) = self.payload(node) else {
            return;
        };
        if p.up_to_date {
            return;
        }
        let mut deps = Vec::new();
        for slot in p.slots.values() {
            match &slot.connection {
                SlotConnection::Multi(list) => deps.extend_from_slice(list),
                SlotConnection::Single(_) => {
                    if let Some(n) = slot.referenced_node() {
                        deps.push(n);
                    }
                }
            }
        }
        for dep in deps {
            self.update(dep);
        }
        let Some(p) = self.payload_mut(node) else {
            return;
        };
        if p.up_to_date {
            return;
        }
        let Some(mut op) = p.op.take() else {
            p.up_to_date = true;
            return;
        };
        op.operate(&mut OpCtx { graph: self, node });
        if let Some(p) = self.payload_mut(node) {
            p.op = Some(op);
            p.up_to_date = true;
        }
    }

    // -------------------------------------------------------------- editor

    /// The node's display name.
    pub fn name(&self, node: NodeId) -> &str {
        self.payload(node).map(|p| p.name.as_str()).unwrap_or("")
    }

    /// Renames the node and notifies its watchers.
    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) {
        let Some(p) = self.payload_mut(node) else {
            return;
        };
        p.name = name.into();
        self.post(Message::new(MessageKind::NodeNameChanged, node));
    }

    /// The node's editor position.
    pub fn position(&self, node: NodeId) -> [f32; 2] {
        self.payload(node).map(|p| p.position).unwrap_or([0.0; 2])
    }

    /// Moves the node in the editor. Positions snap to whole pixels.
    pub fn set_position(&mut self, node: NodeId, position: [f32; 2]) {
        let Some(p) = self.payload_mut(node) else {
            return;
        };
        p.position = [position[0].floor(), position[1].floor()];
        self.post(Message::new(MessageKind::NodePositionChanged, node));
    }

    /// Asks views showing the node to repaint.
    pub fn request_redraw(&mut self, node: NodeId) {
        if self.contains(node) {
            self.post(Message::new(MessageKind::NeedsRedraw, node));
        }
    }

    // ------------------------------------------------------------- watchers

    /// Registers a watcher on a node. Only a weak reference is kept.
    pub fn watch(&mut self, node: NodeId, watcher: &Rc<dyn Watcher>) {
        if let Some(p) = self.payload_mut(node) {
            p.watchers.push(Rc::downgrade(watcher));
        }
    }

    /// Unregisters a watcher from a node.
    pub fn unwatch(&mut self, node: NodeId, watcher: &Rc<dyn Watcher>) {
        if let Some(p) = self.payload_mut(node) {
            p.watchers
                .retain(|w| w.upgrade().is_some_and(|rc| !Rc::ptr_eq(&rc, watcher)));
        }
    }

    fn notify_watchers(&mut self, node: NodeId, f: impl Fn(&dyn Watcher)) {
        let Some(p) = self.payload_mut(node) else {
            return;
        };
        p.watchers.retain(|w| w.strong_count() > 0);
        let live: Vec<Rc<dyn Watcher>> = p.watchers.iter().filter_map(Weak::upgrade).collect();
        for watcher in live {
            f(watcher.as_ref());
        }
    }

    // ------------------------------------------------------------- messages

    /// Posts a message. Identical queued messages collapse. The queue is
    /// drained to a fixpoint before this returns, unless a drain is
    /// already running higher up the stack.
    pub fn post(&mut self, message: Message) {
        self.queue.insert(message);
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(message) = self.queue.shift_remove_index(0) {
            self.deliver(message);
        }
        self.draining = false;
    }

    fn deliver(&mut self, message: Message) {
        let target = message.target;
        let Some(p) = self.payload_mut(target) else {
            return;
        };
        if message.kind.invalidates() && p.up_to_date {
            p.up_to_date = false;
            let dependants = p.dependants.clone();
            for slot_ref in dependants {
                self.post(Message::for_slot(
                    MessageKind::ValueChanged,
                    Some(target),
                    slot_ref,
                ));
            }
        }
        let op = self.payload_mut(target).and_then(|p| p.op.take());
        if let Some(mut op) = op {
            op.handle_message(
                &mut OpCtx {
                    graph: self,
                    node: target,
                },
                &message,
            );
            if let Some(p) = self.payload_mut(target) {
                p.op = Some(op);
            }
        }
        match message.kind {
            MessageKind::NodeNameChanged => {
                self.notify_watchers(target, |w| w.on_name_changed(target));
            }
            MessageKind::NodePositionChanged => {
                self.notify_watchers(target, |w| w.on_position_changed(target));
            }
            MessageKind::NeedsRedraw | MessageKind::ValueChanged => {
                self.notify_watchers(target, |w| w.on_redraw(target));
            }
            MessageKind::SlotStructureChanged => {
                self.notify_watchers(target, |w| w.on_slot_structure_changed(target));
            }
            MessageKind::SlotConnectionChanged
            | MessageKind::MultiSlotConnectionAdded
            | MessageKind::MultiSlotConnectionRemoved
            | MessageKind::MultiSlotCleared => {
                if let Some(slot) = message.slot.clone() {
                    self.notify_watchers(target, |w| w.on_slot_connection_changed(&slot));
                }
            }
        }
    }
}
