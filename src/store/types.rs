//! Value types for record store properties
//!
//! Every property carries a [`PropertyType`] fixed at declaration time. Cell
//! values are [`PropertyValue`]s, a closed set of variants that must match the
//! declared type on assignment. There is no implicit coercion between them.

use std::fmt;

/// Three-component double vector, used for cell corner positions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct V3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl V3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Declared type of a property column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Double,
    Int,
    String,
    V3d,
}

impl PropertyType {
    /// Type name as written in the `Types` section of an ig document.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Double => "double",
            PropertyType::Int => "int",
            PropertyType::String => "string",
            PropertyType::V3d => "v3d",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Double(f64),
    Int(i32),
    String(String),
    V3d(V3d),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Double(_) => PropertyType::Double,
            PropertyValue::Int(_) => PropertyType::Int,
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::V3d(_) => PropertyType::V3d,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_v3d(&self) -> Option<V3d> {
        match self {
            PropertyValue::V3d(v) => Some(*v),
            _ => None,
        }
    }

    /// JSON form used in the `Collections` section of an ig document.
    ///
    /// JSON has no NaN or infinity, so non-finite doubles (and non-finite
    /// `v3d` components) are written as `null`. A cell positioned on the beam
    /// axis has such an eta.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Double(v) => serde_json::json!(v),
            PropertyValue::Int(v) => serde_json::json!(v),
            PropertyValue::String(v) => serde_json::json!(v),
            PropertyValue::V3d(v) => serde_json::json!([v.x, v.y, v.z]),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<V3d> for PropertyValue {
    fn from(v: V3d) -> Self {
        PropertyValue::V3d(v)
    }
}
