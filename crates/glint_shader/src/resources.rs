// SPDX-License-Identifier: MIT OR Apache-2.0
//! Leaf nodes carrying GPU resources.
//!
//! The resources themselves are opaque handles allocated by the host's
//! rendering layer; the nodes only make them addressable from the graph
//! so the shader builder can classify them into samplers and SSBOs.

use std::any::Any;
use std::rc::Rc;

use glint_graph::{NodeKind, NodeOp, OpCtx};

/// An opaque GPU texture handle with its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Host-side handle.
    pub handle: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// An opaque GPU buffer handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuBuffer {
    /// Host-side handle.
    pub handle: u32,
    /// Size in bytes.
    pub byte_size: usize,
}

/// A node holding a texture. The texture may be absent while the host is
/// still loading it; the builder emits a `<param>_CONNECTED` define only
/// for present textures.
#[derive(Debug, Default)]
pub struct TextureOp {
    texture: Option<Rc<Texture>>,
}

impl TextureOp {
    /// Creates a texture node, possibly without a texture yet.
    pub fn new(texture: Option<Rc<Texture>>) -> Self {
        Self { texture }
    }

    /// The held texture.
    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }

    /// Replaces the held texture. Callers invalidate the node through the
    /// graph afterwards so consumers rebuild.
    pub fn set_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.texture = texture;
    }
}

impl NodeOp for TextureOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Texture
    }

    fn operate(&mut self, _ctx: &mut OpCtx<'_>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node holding a GPU buffer, exposed to stubs as an SSBO.
#[derive(Debug, Default)]
pub struct BufferOp {
    buffer: Option<Rc<GpuBuffer>>,
}

impl BufferOp {
    /// Creates a buffer node, possibly without a buffer yet.
    pub fn new(buffer: Option<Rc<GpuBuffer>>) -> Self {
        Self { buffer }
    }

    /// The held buffer.
    pub fn buffer(&self) -> Option<&Rc<GpuBuffer>> {
        self.buffer.as_ref()
    }

    /// Replaces the held buffer.
    pub fn set_buffer(&mut self, buffer: Option<Rc<GpuBuffer>>) {
        self.buffer = buffer;
    }
}

impl NodeOp for BufferOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Buffer
    }

    fn operate(&mut self, _ctx: &mut OpCtx<'_>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
