// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change-propagation messages and their queue semantics.
//!
//! Messages are posted into a set-deduplicated queue on the graph and
//! drained breadth-first to a fixpoint. Posting an already-queued message
//! is a no-op, which keeps fan-out cascades linear in graph size.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::slot::SlotRef;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// The set of slots on a node changed (stub source re-analyzed).
    SlotStructureChanged,
    /// A single slot's connection changed.
    SlotConnectionChanged,
    /// A node was appended to a multi slot.
    MultiSlotConnectionAdded,
    /// A node was removed from a multi slot.
    MultiSlotConnectionRemoved,
    /// A multi slot was emptied.
    MultiSlotCleared,
    /// A value upstream of the target changed.
    ValueChanged,
    /// The target node's display name changed.
    NodeNameChanged,
    /// The target node's editor position changed.
    NodePositionChanged,
    /// The target node wants a redraw of any view showing it.
    NeedsRedraw,
}

impl MessageKind {
    /// Whether this message invalidates the target's cached outputs.
    pub fn invalidates(self) -> bool {
        matches!(
            self,
            MessageKind::SlotConnectionChanged
                | MessageKind::MultiSlotConnectionAdded
                | MessageKind::MultiSlotConnectionRemoved
                | MessageKind::MultiSlotCleared
                | MessageKind::ValueChanged
        )
    }
}

/// A change notification addressed to one node.
///
/// Equal messages collapse in the queue, so a node receives one
/// notification per distinct `(kind, source, target, slot)` tuple per
/// drain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    /// What happened.
    pub kind: MessageKind,
    /// The node the change originated from, if any.
    pub source: Option<NodeId>,
    /// The node to notify.
    pub target: NodeId,
    /// The slot the change concerns, if any.
    pub slot: Option<SlotRef>,
}

impl Message {
    /// A message with no originating node and no slot.
    pub fn new(kind: MessageKind, target: NodeId) -> Self {
        Self {
            kind,
            source: None,
            target,
            slot: None,
        }
    }

    /// A message about a specific slot on the target.
    pub fn for_slot(kind: MessageKind, source: Option<NodeId>, slot: SlotRef) -> Self {
        Self {
            kind,
            source,
            target: slot.node,
            slot: Some(slot),
        }
    }
}
