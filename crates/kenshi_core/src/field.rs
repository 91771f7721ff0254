use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModError;

/// The seven typed field containers of a record, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    Float,
    Int,
    Vec3,
    Vec4,
    String,
    Filename,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        Self::Bool,
        Self::Float,
        Self::Int,
        Self::Vec3,
        Self::Vec4,
        Self::String,
        Self::Filename,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Int => "int",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::String => "string",
            Self::Filename => "filename",
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self {
            Self::Bool => FieldValue::Bool(false),
            Self::Float => FieldValue::Float(0.0),
            Self::Int => FieldValue::Int(0),
            Self::Vec3 => FieldValue::Vec3([0.0; 3]),
            Self::Vec4 => FieldValue::Vec4([0.0; 4]),
            Self::String => FieldValue::String(String::new()),
            Self::Filename => FieldValue::Filename(String::new()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "float" => Ok(Self::Float),
            "int" | "long" => Ok(Self::Int),
            "vec3" | "vec3field" => Ok(Self::Vec3),
            "vec4" | "vec4field" => Ok(Self::Vec4),
            "string" => Ok(Self::String),
            "filename" => Ok(Self::Filename),
            other => Err(ModError::UnknownFieldKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Float(f32),
    Int(i32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    String(String),
    Filename(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Bool(_) => FieldKind::Bool,
            Self::Float(_) => FieldKind::Float,
            Self::Int(_) => FieldKind::Int,
            Self::Vec3(_) => FieldKind::Vec3,
            Self::Vec4(_) => FieldKind::Vec4,
            Self::String(_) => FieldKind::String,
            Self::Filename(_) => FieldKind::Filename,
        }
    }

    /// Scalar numeric view used by diff statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Parses `text` as a value of `kind`. Returns `None` on any mismatch,
    /// including a vector with the wrong number of components.
    pub fn parse_as(kind: FieldKind, text: &str) -> Option<Self> {
        match kind {
            FieldKind::Bool => parse_bool(text).map(Self::Bool),
            FieldKind::Float => text.trim().parse().ok().map(Self::Float),
            FieldKind::Int => text.trim().parse().ok().map(Self::Int),
            FieldKind::Vec3 => parse_vector::<3>(text).map(Self::Vec3),
            FieldKind::Vec4 => parse_vector::<4>(text).map(Self::Vec4),
            FieldKind::String => Some(Self::String(text.to_string())),
            FieldKind::Filename => Some(Self::Filename(text.to_string())),
        }
    }

    /// Plain text form, the inverse of [`FieldValue::parse_as`].
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Bool(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Vec3(v) => join_floats(v, ","),
            Self::Vec4(v) => join_floats(v, ","),
            Self::String(s) | Self::Filename(s) => s.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    /// Display form used by diff reports: strings quoted, vectors bracketed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Vec3(v) => write!(f, "[{}]", join_floats(v, ", ")),
            Self::Vec4(v) => write!(f, "[{}]", join_floats(v, ", ")),
            Self::String(s) | Self::Filename(s) => write!(f, "\"{s}\""),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_vector<const N: usize>(text: &str) -> Option<[f32; N]> {
    let parts: Vec<&str> = text.split(',').filter(|p| !p.is_empty()).collect();
    if parts.len() != N {
        return None;
    }
    let mut out = [0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.trim().parse().ok()?;
    }
    Some(out)
}

fn join_floats(values: &[f32], sep: &str) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
