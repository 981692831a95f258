//! Property schema and dynamic property values
//!
//! Each effect stores its props in a typed struct. The schema and
//! [`PropValue`] exist for the boundary: declarative descriptions and
//! application code that configures a node by property name. Conversion and
//! validation happen here, once, not in the per-frame update.

use std::fmt;

use blinc_core::PackedColor;
use smallvec::SmallVec;

use crate::effects::EffectKind;
use crate::error::{Result, ShaderError};

/// Inline storage for number-list props (gradient stops)
pub type NumberList = SmallVec<[f32; 8]>;

/// Inline storage for color-list props (gradient colors)
pub type ColorList = SmallVec<[PackedColor; 8]>;

/// Declared type of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropType {
    Number,
    /// Packed `0xRRGGBBAA`
    Color,
    Vec2,
    Vec4,
    NumberList,
    ColorList,
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropType::Number => "number",
            PropType::Color => "color",
            PropType::Vec2 => "vec2",
            PropType::Vec4 => "vec4",
            PropType::NumberList => "number list",
            PropType::ColorList => "color list",
        };
        f.write_str(name)
    }
}

/// A dynamically typed property value
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Number(f32),
    Color(PackedColor),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    NumberList(Vec<f32>),
    ColorList(Vec<PackedColor>),
}

impl PropValue {
    pub fn ty(&self) -> PropType {
        match self {
            PropValue::Number(_) => PropType::Number,
            PropValue::Color(_) => PropType::Color,
            PropValue::Vec2(_) => PropType::Vec2,
            PropValue::Vec4(_) => PropType::Vec4,
            PropValue::NumberList(_) => PropType::NumberList,
            PropValue::ColorList(_) => PropType::ColorList,
        }
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        PropValue::Number(v)
    }
}

impl From<[f32; 4]> for PropValue {
    fn from(v: [f32; 4]) -> Self {
        PropValue::Vec4(v)
    }
}

impl From<[f32; 2]> for PropValue {
    fn from(v: [f32; 2]) -> Self {
        PropValue::Vec2(v)
    }
}

/// One declared property
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: &'static str,
    pub ty: PropType,
    pub default: PropValue,
}

/// Ordered property declarations of one effect
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySchema {
    decls: Vec<PropertyDecl>,
}

impl PropertySchema {
    pub fn new(decls: Vec<PropertyDecl>) -> Self {
        Self { decls }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDecl> {
        self.decls.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.decls.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decls.iter().map(|d| d.name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Reject keys of a declarative props object that the schema lacks
    pub fn check_keys(&self, kind: EffectKind, props: &serde_json::Value) -> Result<()> {
        match props {
            serde_json::Value::Null => Ok(()),
            serde_json::Value::Object(map) => {
                for key in map.keys() {
                    if !self.contains(key) {
                        return Err(unknown_property(kind, key));
                    }
                }
                Ok(())
            }
            other => Err(ShaderError::InvalidProps {
                shader: kind.name().to_string(),
                message: format!("expected an object of props, got {}", other),
            }),
        }
    }
}

pub(crate) fn unknown_property(kind: EffectKind, name: &str) -> ShaderError {
    ShaderError::UnknownProperty {
        shader: kind.name().to_string(),
        property: name.to_string(),
    }
}

fn invalid(kind: EffectKind, name: &str, expected: PropType, value: &PropValue) -> ShaderError {
    ShaderError::InvalidProperty {
        shader: kind.name().to_string(),
        property: name.to_string(),
        expected,
        actual: value.ty(),
    }
}

// Typed extraction used by the effects' `set`. Scalars widen to vectors so a
// single number can configure all four corners or edges.

pub(crate) fn number(kind: EffectKind, name: &str, value: PropValue) -> Result<f32> {
    match value {
        PropValue::Number(v) => Ok(v),
        other => Err(invalid(kind, name, PropType::Number, &other)),
    }
}

pub(crate) fn color(kind: EffectKind, name: &str, value: PropValue) -> Result<PackedColor> {
    match value {
        PropValue::Color(v) => Ok(v),
        other => Err(invalid(kind, name, PropType::Color, &other)),
    }
}

pub(crate) fn vec2(kind: EffectKind, name: &str, value: PropValue) -> Result<[f32; 2]> {
    match value {
        PropValue::Vec2(v) => Ok(v),
        PropValue::Number(v) => Ok([v; 2]),
        other => Err(invalid(kind, name, PropType::Vec2, &other)),
    }
}

pub(crate) fn vec4(kind: EffectKind, name: &str, value: PropValue) -> Result<[f32; 4]> {
    match value {
        PropValue::Vec4(v) => Ok(v),
        PropValue::Number(v) => Ok([v; 4]),
        other => Err(invalid(kind, name, PropType::Vec4, &other)),
    }
}

pub(crate) fn number_list(kind: EffectKind, name: &str, value: PropValue) -> Result<NumberList> {
    match value {
        PropValue::NumberList(v) => Ok(v.into_iter().collect()),
        other => Err(invalid(kind, name, PropType::NumberList, &other)),
    }
}

pub(crate) fn color_list(kind: EffectKind, name: &str, value: PropValue) -> Result<ColorList> {
    match value {
        PropValue::ColorList(v) => Ok(v.into_iter().collect()),
        other => Err(invalid(kind, name, PropType::ColorList, &other)),
    }
}
