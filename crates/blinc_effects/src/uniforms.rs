//! Uniform binding surface
//!
//! Effects push their per-draw values through the [`UniformSink`] trait, one
//! operation per uniform shape. Three sinks exist:
//!
//! - [`UniformBlock`]: packs values into a byte buffer laid out the way WGSL
//!   lays out a `var<uniform>` struct, ready for `Queue::write_buffer`
//! - [`UniformSet`]: records named values (template defaults, CPU reference
//!   shading, tests)
//! - [`crate::gpu::EffectContext`]: forwards to the currently bound GPU program
//!
//! Every sink validates the name and shape against a [`UniformLayout`], so an
//! undeclared uniform or a wrong shape is reported instead of being dropped.

use std::fmt;
use std::sync::Arc;

use blinc_core::{normalize_rgba, PackedColor};
use rustc_hash::FxHashMap;

use crate::error::{Result, ShaderError};

/// Shape of a declared uniform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec4,
    /// Fixed-length array of `vec4<f32>`
    Vec4Array(usize),
    Int,
}

impl UniformType {
    /// Alignment in the uniform address space
    pub fn align(&self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec4 | UniformType::Vec4Array(_) => 16,
        }
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec4 => 16,
            UniformType::Vec4Array(len) => 16 * len,
        }
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformType::Float => write!(f, "f32"),
            UniformType::Vec2 => write!(f, "vec2<f32>"),
            UniformType::Vec4 => write!(f, "vec4<f32>"),
            UniformType::Vec4Array(len) => write!(f, "array<vec4<f32>, {}>", len),
            UniformType::Int => write!(f, "i32"),
        }
    }
}

/// A uniform declaration: name and shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub ty: UniformType,
}

impl UniformDecl {
    pub const fn new(name: &'static str, ty: UniformType) -> Self {
        Self { name, ty }
    }
}

/// Borrowed uniform payload passed to [`UniformSink::upload`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformData<'a> {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Vec4Array(&'a [[f32; 4]]),
    Int(i32),
}

impl UniformData<'_> {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformData::Float(_) => UniformType::Float,
            UniformData::Vec2(_) => UniformType::Vec2,
            UniformData::Vec4(_) => UniformType::Vec4,
            UniformData::Vec4Array(values) => UniformType::Vec4Array(values.len()),
            UniformData::Int(_) => UniformType::Int,
        }
    }

    pub fn to_owned_value(&self) -> UniformValue {
        match *self {
            UniformData::Float(v) => UniformValue::Float(v),
            UniformData::Vec2(v) => UniformValue::Vec2(v),
            UniformData::Vec4(v) => UniformValue::Vec4(v),
            UniformData::Vec4Array(v) => UniformValue::Vec4Array(v.to_vec()),
            UniformData::Int(v) => UniformValue::Int(v),
        }
    }
}

/// An owned uniform value
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Vec4Array(Vec<[f32; 4]>),
    Int(i32),
}

impl UniformValue {
    pub fn as_data(&self) -> UniformData<'_> {
        match self {
            UniformValue::Float(v) => UniformData::Float(*v),
            UniformValue::Vec2(v) => UniformData::Vec2(*v),
            UniformValue::Vec4(v) => UniformData::Vec4(*v),
            UniformValue::Vec4Array(v) => UniformData::Vec4Array(v),
            UniformValue::Int(v) => UniformData::Int(*v),
        }
    }

    pub fn ty(&self) -> UniformType {
        self.as_data().ty()
    }
}

/// The contract between effect code and a graphics context
///
/// Implementors only provide [`UniformSink::upload`]; the typed helpers route
/// through it. Errors are returned to the caller, never swallowed.
pub trait UniformSink {
    /// Upload one uniform value by name
    fn upload(&mut self, name: &str, data: UniformData<'_>) -> Result<()>;

    fn uniform_1f(&mut self, name: &str, value: f32) -> Result<()> {
        self.upload(name, UniformData::Float(value))
    }

    fn uniform_2f(&mut self, name: &str, value: [f32; 2]) -> Result<()> {
        self.upload(name, UniformData::Vec2(value))
    }

    fn uniform_4f(&mut self, name: &str, value: [f32; 4]) -> Result<()> {
        self.upload(name, UniformData::Vec4(value))
    }

    fn uniform_4fa(&mut self, name: &str, values: &[[f32; 4]]) -> Result<()> {
        self.upload(name, UniformData::Vec4Array(values))
    }

    fn uniform_1i(&mut self, name: &str, value: i32) -> Result<()> {
        self.upload(name, UniformData::Int(value))
    }

    /// Upload a packed `0xRRGGBBAA` color as normalized `vec4<f32>`
    fn uniform_rgba(&mut self, name: &str, color: PackedColor) -> Result<()> {
        self.uniform_4f(name, normalize_rgba(color))
    }
}

/// A declared uniform with its byte offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub ty: UniformType,
    pub offset: usize,
}

/// Ordered uniform declarations with WGSL uniform-buffer offsets
#[derive(Clone, Debug)]
pub struct UniformLayout {
    slots: Vec<UniformSlot>,
    index: FxHashMap<&'static str, usize>,
    size: usize,
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

impl UniformLayout {
    /// Lay out declarations in order, following WGSL alignment rules
    pub fn new<'a>(decls: impl IntoIterator<Item = &'a UniformDecl>) -> Self {
        let mut slots = Vec::new();
        let mut index = FxHashMap::default();
        let mut offset = 0;

        for decl in decls {
            debug_assert!(
                !index.contains_key(decl.name),
                "uniform '{}' declared twice",
                decl.name
            );
            offset = round_up(offset, decl.ty.align());
            index.insert(decl.name, slots.len());
            slots.push(UniformSlot {
                name: decl.name,
                ty: decl.ty,
                offset,
            });
            offset += decl.ty.size();
        }

        Self {
            slots,
            index,
            // Uniform buffer structs are sized to a multiple of 16 bytes
            size: round_up(offset.max(16), 16),
        }
    }

    pub fn slot(&self, name: &str) -> Option<&UniformSlot> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &UniformSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total buffer size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check an upload against the declaration and return its slot
    pub fn check(&self, name: &str, data: &UniformData<'_>) -> Result<&UniformSlot> {
        let slot = self
            .slot(name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))?;

        match (slot.ty, data) {
            (UniformType::Vec4Array(capacity), UniformData::Vec4Array(values)) => {
                if values.len() > capacity {
                    return Err(ShaderError::UniformArrayOverflow {
                        name: name.to_string(),
                        capacity,
                        len: values.len(),
                    });
                }
            }
            (declared, data) if declared != data.ty() => {
                return Err(ShaderError::UniformTypeMismatch {
                    name: name.to_string(),
                    declared,
                    uploaded: data.ty(),
                });
            }
            _ => {}
        }

        Ok(slot)
    }

    /// WGSL struct declaration matching this layout
    pub fn wgsl_struct(&self, struct_name: &str) -> String {
        let mut out = format!("struct {} {{\n", struct_name);
        for slot in &self.slots {
            out.push_str(&format!("    {}: {},\n", slot.name, slot.ty));
        }
        out.push_str("}\n");
        out
    }
}

/// Uniform values packed into a GPU-ready byte buffer
///
/// Every upload rewrites its slot; unwritten array tails are zeroed so a
/// shorter upload never leaves stale elements behind.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    layout: Arc<UniformLayout>,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: Arc<UniformLayout>) -> Self {
        let bytes = vec![0u8; layout.size()];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &Arc<UniformLayout> {
        &self.layout
    }

    /// Packed bytes for `Queue::write_buffer`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode a slot back into a value
    pub fn read(&self, name: &str) -> Option<UniformValue> {
        let slot = self.layout.slot(name)?;
        let at = |offset: usize| -> f32 {
            bytemuck::pod_read_unaligned(&self.bytes[offset..offset + 4])
        };
        let vec4 = |offset: usize| [at(offset), at(offset + 4), at(offset + 8), at(offset + 12)];

        Some(match slot.ty {
            UniformType::Float => UniformValue::Float(at(slot.offset)),
            UniformType::Vec2 => UniformValue::Vec2([at(slot.offset), at(slot.offset + 4)]),
            UniformType::Vec4 => UniformValue::Vec4(vec4(slot.offset)),
            UniformType::Vec4Array(len) => {
                UniformValue::Vec4Array((0..len).map(|i| vec4(slot.offset + i * 16)).collect())
            }
            UniformType::Int => UniformValue::Int(bytemuck::pod_read_unaligned(
                &self.bytes[slot.offset..slot.offset + 4],
            )),
        })
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

impl UniformSink for UniformBlock {
    fn upload(&mut self, name: &str, data: UniformData<'_>) -> Result<()> {
        let slot = *self.layout.check(name, &data)?;

        match data {
            UniformData::Float(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformData::Vec2(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformData::Vec4(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformData::Int(v) => self.write(slot.offset, bytemuck::bytes_of(&v)),
            UniformData::Vec4Array(values) => {
                let written: &[u8] = bytemuck::cast_slice(values);
                let end = slot.offset + slot.ty.size();
                self.write(slot.offset, written);
                self.bytes[slot.offset + written.len()..end].fill(0);
            }
        }

        Ok(())
    }
}

/// Named uniform values recorded against a layout
#[derive(Clone, Debug)]
pub struct UniformSet {
    layout: Arc<UniformLayout>,
    values: FxHashMap<&'static str, UniformValue>,
}

impl UniformSet {
    pub fn new(layout: Arc<UniformLayout>) -> Self {
        Self {
            layout,
            values: FxHashMap::default(),
        }
    }

    pub fn layout(&self) -> &Arc<UniformLayout> {
        &self.layout
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Recorded values in layout order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.layout
            .slots()
            .filter_map(|slot| self.values.get(slot.name).map(|v| (slot.name, v)))
    }

    /// Replay every recorded value into another sink
    pub fn apply(&self, sink: &mut dyn UniformSink) -> Result<()> {
        for (name, value) in self.iter() {
            sink.upload(name, value.as_data())?;
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&UniformValue> {
        self.values
            .get(name)
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_string()))
    }

    fn mismatch(name: &str, value: &UniformValue, requested: UniformType) -> ShaderError {
        ShaderError::UniformTypeMismatch {
            name: name.to_string(),
            declared: value.ty(),
            uploaded: requested,
        }
    }

    pub fn float(&self, name: &str) -> Result<f32> {
        match self.lookup(name)? {
            UniformValue::Float(v) => Ok(*v),
            other => Err(Self::mismatch(name, other, UniformType::Float)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<[f32; 2]> {
        match self.lookup(name)? {
            UniformValue::Vec2(v) => Ok(*v),
            other => Err(Self::mismatch(name, other, UniformType::Vec2)),
        }
    }

    pub fn vec4(&self, name: &str) -> Result<[f32; 4]> {
        match self.lookup(name)? {
            UniformValue::Vec4(v) => Ok(*v),
            other => Err(Self::mismatch(name, other, UniformType::Vec4)),
        }
    }

    pub fn vec4_array(&self, name: &str) -> Result<&[[f32; 4]]> {
        match self.lookup(name)? {
            UniformValue::Vec4Array(v) => Ok(v),
            other => Err(Self::mismatch(name, other, UniformType::Vec4Array(0))),
        }
    }

    pub fn int(&self, name: &str) -> Result<i32> {
        match self.lookup(name)? {
            UniformValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(name, other, UniformType::Int)),
        }
    }
}

impl UniformSink for UniformSet {
    fn upload(&mut self, name: &str, data: UniformData<'_>) -> Result<()> {
        let slot = *self.layout.check(name, &data)?;
        self.values.insert(slot.name, data.to_owned_value());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Arc<UniformLayout> {
        Arc::new(UniformLayout::new(&[
            UniformDecl::new("alpha", UniformType::Float),
            UniformDecl::new("dimensions", UniformType::Vec2),
            UniformDecl::new("color", UniformType::Vec4),
            UniformDecl::new("asym", UniformType::Int),
            UniformDecl::new("stops", UniformType::Vec4Array(2)),
        ]))
    }

    #[test]
    fn test_layout_follows_wgsl_alignment() {
        let layout = layout();
        assert_eq!(layout.slot("alpha").unwrap().offset, 0);
        // vec2 aligns to 8
        assert_eq!(layout.slot("dimensions").unwrap().offset, 8);
        // vec4 aligns to 16
        assert_eq!(layout.slot("color").unwrap().offset, 16);
        assert_eq!(layout.slot("asym").unwrap().offset, 32);
        // arrays of vec4 align to 16
        assert_eq!(layout.slot("stops").unwrap().offset, 48);
        assert_eq!(layout.size(), 80);
    }

    #[test]
    fn test_layout_size_is_multiple_of_16() {
        let layout = UniformLayout::new(&[UniformDecl::new("alpha", UniformType::Float)]);
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn test_wgsl_struct() {
        let src = layout().wgsl_struct("Uniforms");
        assert!(src.starts_with("struct Uniforms {"));
        assert!(src.contains("    dimensions: vec2<f32>,\n"));
        assert!(src.contains("    stops: array<vec4<f32>, 2>,\n"));
        assert!(src.contains("    asym: i32,\n"));
    }

    #[test]
    fn test_block_writes_and_reads_back() {
        let mut block = UniformBlock::new(layout());
        block.uniform_1f("alpha", 0.5).unwrap();
        block.uniform_2f("dimensions", [200.0, 100.0]).unwrap();
        block.uniform_rgba("color", 0xff0000ff).unwrap();
        block.uniform_1i("asym", 1).unwrap();

        assert_eq!(block.read("alpha"), Some(UniformValue::Float(0.5)));
        assert_eq!(block.read("dimensions"), Some(UniformValue::Vec2([200.0, 100.0])));
        assert_eq!(block.read("color"), Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0])));
        assert_eq!(block.read("asym"), Some(UniformValue::Int(1)));
        assert_eq!(&block.as_bytes()[0..4], &0.5f32.to_ne_bytes());
    }

    #[test]
    fn test_shorter_array_upload_clears_tail() {
        let mut block = UniformBlock::new(layout());
        block
            .uniform_4fa("stops", &[[1.0; 4], [2.0; 4]])
            .unwrap();
        block.uniform_4fa("stops", &[[3.0; 4]]).unwrap();
        assert_eq!(
            block.read("stops"),
            Some(UniformValue::Vec4Array(vec![[3.0; 4], [0.0; 4]]))
        );
    }

    #[test]
    fn test_unknown_uniform_is_an_error() {
        let mut block = UniformBlock::new(layout());
        assert_eq!(
            block.uniform_1f("radius", 1.0),
            Err(ShaderError::UnknownUniform("radius".to_string()))
        );
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let mut set = UniformSet::new(layout());
        let err = set.uniform_1i("alpha", 1).unwrap_err();
        assert_eq!(
            err,
            ShaderError::UniformTypeMismatch {
                name: "alpha".to_string(),
                declared: UniformType::Float,
                uploaded: UniformType::Int,
            }
        );
    }

    #[test]
    fn test_array_overflow_is_an_error() {
        let mut set = UniformSet::new(layout());
        let err = set.uniform_4fa("stops", &[[0.0; 4]; 3]).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::UniformArrayOverflow {
                capacity: 2,
                len: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_set_replays_into_block() {
        let mut set = UniformSet::new(layout());
        set.uniform_1f("alpha", 0.25).unwrap();
        set.uniform_4f("color", [0.1, 0.2, 0.3, 0.4]).unwrap();

        let mut block = UniformBlock::new(layout());
        set.apply(&mut block).unwrap();
        assert_eq!(block.read("alpha"), Some(UniformValue::Float(0.25)));
        assert_eq!(set.vec4("color").unwrap(), [0.1, 0.2, 0.3, 0.4]);
        assert!(set.int("asym").is_err());
    }
}
