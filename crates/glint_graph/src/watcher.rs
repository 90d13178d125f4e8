// SPDX-License-Identifier: MIT OR Apache-2.0
//! Weak observers notified of node changes.
//!
//! Watchers power editor surfaces: a widget registers itself on the node
//! it displays and reacts to the callbacks below. The graph holds only
//! weak references, so dropping a widget unregisters it implicitly.

use crate::node::NodeId;
use crate::slot::SlotRef;

/// Observer of a single node. All callbacks default to no-ops so
/// implementors override only what they care about.
pub trait Watcher {
    /// The watched node's output changed and views should repaint.
    fn on_redraw(&self, node: NodeId) {
        let _ = node;
    }

    /// The watched node's display name changed.
    fn on_name_changed(&self, node: NodeId) {
        let _ = node;
    }

    /// A slot's connection on the watched node changed.
    fn on_slot_connection_changed(&self, slot: &SlotRef) {
        let _ = slot;
    }

    /// The watched node's slot list was rebuilt.
    fn on_slot_structure_changed(&self, node: NodeId) {
        let _ = node;
    }

    /// The watched node moved in the editor.
    fn on_position_changed(&self, node: NodeId) {
        let _ = node;
    }

    /// The watched node is being disposed. After this call the handle is
    /// stale and must not be used for lookups.
    fn on_node_removed(&self, node: NodeId) {
        let _ = node;
    }
}
