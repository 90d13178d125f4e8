// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain values carried by value nodes and slot defaults.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::node::{NodeKind, NodeOp, OpCtx};

/// The type of a [`Value`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Scalar float.
    Float,
    /// Two-component vector.
    Vec2,
    /// Three-component vector.
    Vec3,
    /// Four-component vector.
    Vec4,
    /// Column-major 4x4 matrix.
    Mat4,
    /// UTF-8 text, used for shader stub sources.
    Text,
}

impl ValueKind {
    /// Returns the GLSL type name for this kind, or `None` for kinds that
    /// have no shader representation.
    pub fn glsl_name(self) -> Option<&'static str> {
        match self {
            ValueKind::Float => Some("float"),
            ValueKind::Vec2 => Some("vec2"),
            ValueKind::Vec3 => Some("vec3"),
            ValueKind::Vec4 => Some("vec4"),
            ValueKind::Mat4 => Some("mat4"),
            ValueKind::Text => None,
        }
    }
}

/// A concrete value held by a value node or a slot default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Scalar float.
    Float(f32),
    /// Two-component vector.
    Vec2([f32; 2]),
    /// Three-component vector.
    Vec3([f32; 3]),
    /// Four-component vector.
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([[f32; 4]; 4]),
    /// UTF-8 text.
    Text(String),
}

impl Value {
    /// Returns the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Vec4(_) => ValueKind::Vec4,
            Value::Mat4(_) => ValueKind::Mat4,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Returns the zero value for a kind. Matrices default to identity so
    /// that transform slots are usable before anything is connected.
    pub fn zero(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Vec2 => Value::Vec2([0.0; 2]),
            ValueKind::Vec3 => Value::Vec3([0.0; 3]),
            ValueKind::Vec4 => Value::Vec4([0.0; 4]),
            ValueKind::Mat4 => Value::Mat4([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            ValueKind::Text => Value::Text(String::new()),
        }
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a float value.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// A node that holds a single constant value.
///
/// Every value slot owns a hidden node of this type that supplies the
/// slot's default; the same type backs user-created constant nodes.
#[derive(Debug)]
pub struct StaticValueOp {
    value: Value,
}

impl StaticValueOp {
    /// Creates a value node holding `value`.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Returns the held value.
    pub fn get(&self) -> &Value {
        &self.value
    }

    /// Replaces the held value. Callers go through
    /// [`Graph::set_value`](crate::graph::Graph::set_value) so that
    /// dependants get notified.
    pub(crate) fn set(&mut self, value: Value) {
        self.value = value;
    }
}

impl NodeOp for StaticValueOp {
    fn kind(&self) -> NodeKind {
        NodeKind::Value(self.value.kind())
    }

    fn value(&self) -> Option<Value> {
        Some(self.value.clone())
    }

    fn operate(&mut self, _ctx: &mut OpCtx<'_>) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
