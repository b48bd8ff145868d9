//! Value - Runtime values held by properties
//!
//! Values are what flows along property connections.

use core::fmt;
use schem_asset::AssetHandle;
use schem_core::Guid;
use serde::{Deserialize, Serialize};

/// Type information for a value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Any type; conversions infer the value from its text
    #[default]
    Any,
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int,
    /// 32-bit unsigned integer
    UInt,
    /// 32-bit float
    Float,
    /// String
    String,
    /// Guid
    Guid,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// Externally loaded resource
    Asset,
}

impl ValueType {
    /// Check if a value of this type can be stored in a slot of `other`
    pub fn is_compatible_with(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) | (_, ValueType::Any) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (a, b) => a == b,
        }
    }

    /// Int, UInt or Float
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::UInt | ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runtime value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value
    #[default]
    None,
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    String(String),
    Guid(Guid),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Handle to a loaded resource; only exists at runtime
    #[serde(skip)]
    Asset(AssetHandle),
}

impl Value {
    /// Get the type of this value. `None` reports `Any`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::Any,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Guid(_) => ValueType::Guid,
            Value::Vec2(_) => ValueType::Vec2,
            Value::Vec3(_) => ValueType::Vec3,
            Value::Vec4(_) => ValueType::Vec4,
            Value::Asset(_) => ValueType::Asset,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::UInt(u) => Some(*u != 0),
            _ => None,
        }
    }

    /// Try to convert to int
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i32::try_from(*u).ok(),
            Value::Float(f) => Some(*f as i32),
            Value::Bool(b) => Some(i32::from(*b)),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            Value::UInt(u) => Some(*u as f32),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an asset handle
    pub fn as_asset(&self) -> Option<&AssetHandle> {
        match self {
            Value::Asset(handle) => Some(handle),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<AssetHandle> for Value {
    fn from(v: AssetHandle) -> Self {
        Value::Asset(v)
    }
}
