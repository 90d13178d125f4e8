// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow node graph for the glint demo tool.
//!
//! This crate provides the document model the rest of the tool is built on:
//! - Nodes stored in a generational arena, addressed by [`NodeId`]
//! - Typed slots with optional built-in default values
//! - Lazy, memoized evaluation driven by a dirty flag per node
//! - A deduplicating message queue for change propagation
//! - Transitive closure traversal in dependency order
//! - Weak observers ([`Watcher`]) for editor surfaces
//!
//! ## Architecture
//!
//! Node behavior lives in [`NodeOp`] implementations; the [`Graph`] owns
//! all structural state (slots, connections, reverse dependants) so that
//! operations like connect and dispose can keep both directions of every
//! edge consistent.

pub mod closure;
pub mod graph;
pub mod message;
pub mod node;
pub mod slot;
pub mod value;
pub mod watcher;

pub use closure::transitive_closure;
pub use graph::{Graph, GraphError};
pub use message::{Message, MessageKind};
pub use node::{NodeId, NodeKind, NodeOp, OpCtx};
pub use slot::{Slot, SlotConnection, SlotId, SlotKind, SlotRef, SlotSnapshot, SlotSpec};
pub use value::{StaticValueOp, Value, ValueKind};
pub use watcher::Watcher;
