//! Geometry value types
//!
//! Four-component quantities follow two fixed orders:
//! corner radii are `(top-left, top-right, bottom-right, bottom-left)` and
//! edge widths are `(top, right, bottom, left)`, both clockwise from the top.

use serde::{Deserialize, Serialize};

/// A plain 4-component vector as uploaded to the GPU
pub type Vec4 = [f32; 4];

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn abs(&self) -> Vec2 {
        Vec2::new(self.x.abs(), self.y.abs())
    }

    pub fn max(&self, other: Vec2) -> Vec2 {
        Vec2::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn to_array(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// A position in node or world space
pub type Point = Vec2;

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn to_array(&self) -> [f32; 2] {
        [self.width, self.height]
    }

    /// Half extents as a vector
    pub fn half(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Whether either dimension is zero, negative or not finite
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Serialized form for 4-component props: a single number or four numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum QuadRepr {
    Uniform(f32),
    PerSide([f32; 4]),
}

impl QuadRepr {
    fn expand(self) -> [f32; 4] {
        match self {
            QuadRepr::Uniform(v) => [v; 4],
            QuadRepr::PerSide(v) => v,
        }
    }
}

/// Corner radii (top-left, top-right, bottom-right, bottom-left)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuadRepr", into = "[f32; 4]")]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const ZERO: CornerRadius = CornerRadius {
        top_left: 0.0,
        top_right: 0.0,
        bottom_right: 0.0,
        bottom_left: 0.0,
    };

    /// Create a corner radius with different values for each corner.
    /// Order: top_left, top_right, bottom_right, bottom_left (clockwise from top-left)
    pub const fn new(top_left: f32, top_right: f32, bottom_right: f32, bottom_left: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub const fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    pub const fn from_array(r: [f32; 4]) -> Self {
        Self::new(r[0], r[1], r[2], r[3])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

impl From<f32> for CornerRadius {
    fn from(radius: f32) -> Self {
        Self::uniform(radius)
    }
}

impl From<[f32; 4]> for CornerRadius {
    fn from(r: [f32; 4]) -> Self {
        Self::from_array(r)
    }
}

impl From<QuadRepr> for CornerRadius {
    fn from(repr: QuadRepr) -> Self {
        Self::from_array(repr.expand())
    }
}

impl From<CornerRadius> for [f32; 4] {
    fn from(r: CornerRadius) -> Self {
        r.to_array()
    }
}

/// Per-edge widths (top, right, bottom, left)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "QuadRepr", into = "[f32; 4]")]
pub struct EdgeWidths {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl EdgeWidths {
    pub const ZERO: EdgeWidths = EdgeWidths {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(width: f32) -> Self {
        Self::new(width, width, width, width)
    }

    pub const fn from_array(w: [f32; 4]) -> Self {
        Self::new(w[0], w[1], w[2], w[3])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

impl From<f32> for EdgeWidths {
    fn from(width: f32) -> Self {
        Self::uniform(width)
    }
}

impl From<[f32; 4]> for EdgeWidths {
    fn from(w: [f32; 4]) -> Self {
        Self::from_array(w)
    }
}

impl From<QuadRepr> for EdgeWidths {
    fn from(repr: QuadRepr) -> Self {
        Self::from_array(repr.expand())
    }
}

impl From<EdgeWidths> for [f32; 4] {
    fn from(w: EdgeWidths) -> Self {
        w.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_expands_to_four_corners() {
        let radius: CornerRadius = serde_json::from_str("12").unwrap();
        assert_eq!(radius, CornerRadius::uniform(12.0));
    }

    #[test]
    fn test_array_keeps_corner_order() {
        let radius: CornerRadius = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(radius.top_left, 1.0);
        assert_eq!(radius.top_right, 2.0);
        assert_eq!(radius.bottom_right, 3.0);
        assert_eq!(radius.bottom_left, 4.0);
    }

    #[test]
    fn test_edge_widths_serialize_as_array() {
        let json = serde_json::to_string(&EdgeWidths::new(4.0, 8.0, 4.0, 8.0)).unwrap();
        assert_eq!(json, "[4.0,8.0,4.0,8.0]");
    }

    #[test]
    fn test_three_components_rejected() {
        assert!(serde_json::from_str::<EdgeWidths>("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_degenerate_size() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(10.0, -1.0).is_degenerate());
        assert!(Size::new(f32::NAN, 10.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
    }
}
