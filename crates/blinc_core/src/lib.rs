//! Blinc Core Types
//!
//! Value types shared between the Blinc scene graph and the effect shaders:
//!
//! - **Color**: linear RGBA color with packed `0xRRGGBBAA` conversion
//! - **Geometry**: points, sizes, per-corner radii and per-edge widths
//!
//! # Example
//!
//! ```rust
//! use blinc_core::{normalize_rgba, Color};
//!
//! let red = Color::from_packed(0xff0000ff);
//! assert_eq!(red, Color::RED);
//! assert_eq!(normalize_rgba(0xff0000ff), [1.0, 0.0, 0.0, 1.0]);
//! ```

pub mod color;
pub mod geometry;

pub use color::{normalize_rgba, Color, PackedColor};
pub use geometry::{CornerRadius, EdgeWidths, Point, Size, Vec2, Vec4};
