//! CPU reference of the effect SDF math
//!
//! Mirrors the WGSL library in [`crate::shaders::SDF_LIBRARY`] function for
//! function. Used to shade single pixels without a GPU (tests, hit testing,
//! software fallback).

use blinc_core::{Color, Vec2, Vec4};

use crate::error::Result;
use crate::math::smoothstep;
use crate::uniforms::UniformSet;

/// Most gradient stops a single effect supports
pub const MAX_STOPS: usize = 8;

/// Inputs of one fragment invocation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    /// Node-local pixel position, origin at the top-left corner
    pub node_coords: Vec2,
    /// Texture sample at this position
    pub texel: Color,
}

impl Fragment {
    pub fn new(node_coords: Vec2, texel: Color) -> Self {
        Self { node_coords, texel }
    }
}

/// Signed distance to a box of half-size `s` with per-corner radii `r`
///
/// `p` is relative to the box center. The corner radius is picked by the
/// quadrant `p` falls in; y grows downward.
pub fn rounded_box(p: Vec2, s: Vec2, r: Vec4) -> f32 {
    let [tl, tr, br, bl] = r;
    let rc = match (p.x > 0.0, p.y > 0.0) {
        (false, false) => tl,
        (true, false) => tr,
        (true, true) => br,
        (false, true) => bl,
    };
    let q = p.abs() - s + Vec2::new(rc, rc);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - rc
}

pub fn rounded_coverage(dist: f32, aa: f32) -> f32 {
    1.0 - smoothstep(0.0, aa, dist)
}

pub fn sym_border_coverage(outer_dist: f32, width: f32, aa: f32) -> f32 {
    1.0 - smoothstep(width - aa, width, outer_dist.abs())
}

/// Radii of the inner edge of a border
pub fn inner_radius(r: Vec4, w: Vec4) -> Vec4 {
    let [top, right, bottom, left] = w;
    let adjacent = [top.max(left), top.max(right), bottom.max(right), bottom.max(left)];
    [
        (r[0] - adjacent[0]).max(0.0),
        (r[1] - adjacent[1]).max(0.0),
        (r[2] - adjacent[2]).max(0.0),
        (r[3] - adjacent[3]).max(0.0),
    ]
}

pub fn asym_border_coverage(p: Vec2, outer_dist: f32, r: Vec4, w: Vec4, dims: Vec2, aa: f32) -> f32 {
    let [top, right, bottom, left] = w;
    let inner_half = Vec2::new(
        ((dims.x - (left + right)) * 0.5).max(0.0),
        ((dims.y - (top + bottom)) * 0.5).max(0.0),
    );
    let inner_center = Vec2::new((left - right) * 0.5, (top - bottom) * 0.5);
    let inner_dist = rounded_box(p - inner_center, inner_half, inner_radius(r, w));
    1.0 - smoothstep(0.0, aa, (-inner_dist).max(outer_dist))
}

pub fn border_coverage(
    p: Vec2,
    outer_dist: f32,
    r: Vec4,
    w: Vec4,
    asym: bool,
    dims: Vec2,
    aa: f32,
) -> f32 {
    if asym {
        asym_border_coverage(p, outer_dist, r, w, dims, aa)
    } else {
        sym_border_coverage(outer_dist, w[0], aa)
    }
}

/// Soft shadow coverage for projection `(offset-x, offset-y, blur, spread)`
pub fn shadow_coverage(p: Vec2, s: Vec2, r: Vec4, shadow: Vec4, aa: f32) -> f32 {
    let [dx, dy, blur, spread] = shadow;
    let blur = blur.max(0.0);
    let size = (s + Vec2::new(spread, spread)).max(Vec2::ZERO);
    let dist = rounded_box(p - Vec2::new(dx, dy), size, r.map(|c| c + blur));
    let band = blur.max(aa);
    1.0 - smoothstep(-band, band, dist)
}

/// Back-to-front compositing of shadow, fill and border
///
/// The border never extends past the rounded silhouette.
pub fn composite(
    shadow_color: Color,
    shadow: f32,
    fill: Color,
    rounded: f32,
    border_color: Color,
    border: f32,
) -> Color {
    let mut result = Color::TRANSPARENT;
    result = Color::lerp(&result, &shadow_color, shadow);
    result = Color::lerp(&result, &fill, fill.a.min(rounded));
    Color::lerp(&result, &border_color, border_color.a.min(border.min(rounded)))
}

/// Piecewise-linear gradient lookup, clamped at both ends
///
/// `stops` are packed four per element, as uploaded.
pub fn gradient_color(colors: &[[f32; 4]], stops: &[[f32; 4]], count: usize, t: f32) -> Color {
    let count = count.min(MAX_STOPS).min(colors.len()).min(stops.len() * 4);
    if count == 0 {
        return Color::TRANSPARENT;
    }
    let stop = |i: usize| stops[i / 4][i % 4];

    let mut color = Color::from_array(colors[0]);
    for i in 1..count {
        let (t0, t1) = (stop(i - 1), stop(i));
        let f = ((t - t0) / (t1 - t0).max(0.00001)).clamp(0.0, 1.0);
        color = Color::lerp(&color, &Color::from_array(colors[i]), f);
    }
    color
}

/// Built-in uniforms resolved for one fragment
pub(crate) struct Sample {
    /// Tinted texture sample
    pub fill: Color,
    pub dims: Vec2,
    pub half: Vec2,
    /// Position relative to the node center
    pub p: Vec2,
    pub node_coords: Vec2,
    pub aa: f32,
    pub alpha: f32,
}

impl Sample {
    pub fn read(uniforms: &UniformSet, frag: &Fragment) -> Result<Self> {
        let [w, h] = uniforms.vec2("dimensions")?;
        let dims = Vec2::new(w, h);
        let half = dims * 0.5;
        let tint = Color::from_array(uniforms.vec4("tint")?);

        Ok(Self {
            fill: frag.texel.modulate(&tint),
            dims,
            half,
            p: frag.node_coords - half,
            node_coords: frag.node_coords,
            aa: uniforms.float("pixel_ratio")?,
            alpha: uniforms.float("alpha")?,
        })
    }

    /// Apply the node's world alpha to a composited color
    pub fn finish(&self, color: Color) -> Color {
        color.scale(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_rounded_box_center_is_deep_inside() {
        let s = Vec2::new(100.0, 50.0);
        let d = rounded_box(Vec2::ZERO, s, [10.0; 4]);
        assert!(approx(d, -50.0));
    }

    #[test]
    fn test_rounded_box_far_outside_is_corner_distance() {
        let s = Vec2::new(100.0, 50.0);
        // square corners: distance to (100, 50)
        let d = rounded_box(Vec2::new(130.0, 90.0), s, [0.0; 4]);
        assert!(approx(d, 50.0));
        // rounded corner adds (sqrt(2) - 1) * r along the diagonal
        let d = rounded_box(Vec2::new(130.0, 80.0), s, [10.0; 4]);
        let expected = Vec2::new(40.0, 40.0).length() - 10.0;
        assert!(approx(d, expected));
    }

    #[test]
    fn test_rounded_box_picks_corner_by_quadrant() {
        let s = Vec2::new(50.0, 50.0);
        let r = [0.0, 20.0, 0.0, 0.0];
        // top-left is square, top-right is rounded
        assert!(rounded_box(Vec2::new(-49.5, -49.5), s, r) < 0.0);
        assert!(rounded_box(Vec2::new(49.5, -49.5), s, r) > 0.0);
        assert!(rounded_box(Vec2::new(49.5, 49.5), s, r) < 0.0);
    }

    #[test]
    fn test_sym_border_band() {
        assert_eq!(sym_border_coverage(-2.0, 4.0, 1.0), 1.0);
        assert_eq!(sym_border_coverage(-6.0, 4.0, 1.0), 0.0);
        assert!(sym_border_coverage(-3.5, 4.0, 1.0) > 0.0);
    }

    #[test]
    fn test_inner_radius_shrinks_by_widest_adjacent_edge() {
        let r = inner_radius([10.0; 4], [4.0, 8.0, 4.0, 8.0]);
        assert_eq!(r, [2.0; 4]);
        assert_eq!(inner_radius([2.0; 4], [4.0; 4]), [0.0; 4]);
    }

    #[test]
    fn test_asym_border_follows_edge_widths() {
        let dims = Vec2::new(200.0, 100.0);
        let s = dims * 0.5;
        let r = [10.0; 4];
        let w = [4.0, 8.0, 4.0, 8.0];

        // 6 px inside the right edge: inside the 8 px band
        let p = Vec2::new(94.0, 0.0);
        let outer = rounded_box(p, s, r);
        assert_eq!(asym_border_coverage(p, outer, r, w, dims, 1.0), 1.0);

        // 6 px inside the top edge: past the 4 px band
        let p = Vec2::new(0.0, -44.0);
        let outer = rounded_box(p, s, r);
        assert_eq!(asym_border_coverage(p, outer, r, w, dims, 1.0), 0.0);
    }

    #[test]
    fn test_shadow_without_blur_is_antialiased() {
        let s = Vec2::new(50.0, 50.0);
        let shadow = [0.0, 0.0, 0.0, 0.0];
        let inside = shadow_coverage(Vec2::ZERO, s, [0.0; 4], shadow, 1.0);
        let outside = shadow_coverage(Vec2::new(60.0, 0.0), s, [0.0; 4], shadow, 1.0);
        assert_eq!(inside, 1.0);
        assert_eq!(outside, 0.0);
        let edge = shadow_coverage(Vec2::new(50.0, 0.0), s, [0.0; 4], shadow, 1.0);
        assert!(approx(edge, 0.5));
    }

    #[test]
    fn test_shadow_follows_offset_and_spread() {
        let s = Vec2::new(50.0, 50.0);
        let shadow = [20.0, 0.0, 0.0, 10.0];
        // right edge moves to 50 + 20 + 10
        assert_eq!(shadow_coverage(Vec2::new(75.0, 0.0), s, [0.0; 4], shadow, 1.0), 1.0);
        assert_eq!(shadow_coverage(Vec2::new(85.0, 0.0), s, [0.0; 4], shadow, 1.0), 0.0);
    }

    #[test]
    fn test_composite_order() {
        let fill = Color::rgba(0.0, 0.5, 1.0, 1.0);
        // full fill covers the shadow
        let c = composite(Color::BLACK, 1.0, fill, 1.0, Color::RED, 0.0);
        assert_eq!(c, fill);
        // border sits on top of the fill
        let c = composite(Color::BLACK, 1.0, fill, 1.0, Color::RED, 1.0);
        assert_eq!(c, Color::RED);
        // outside the silhouette only the shadow remains
        let c = composite(Color::BLACK, 1.0, fill, 0.0, Color::RED, 1.0);
        assert_eq!(c, Color::BLACK);
    }

    #[test]
    fn test_gradient_color_interpolates_and_clamps() {
        let colors = [[0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]];
        let stops = [[0.0, 1.0, 0.0, 0.0]];
        assert_eq!(gradient_color(&colors, &stops, 2, -1.0), Color::BLACK);
        assert_eq!(gradient_color(&colors, &stops, 2, 2.0), Color::WHITE);
        let mid = gradient_color(&colors, &stops, 2, 0.5);
        assert!(approx(mid.r, 0.5));
        assert_eq!(gradient_color(&colors, &stops, 0, 0.5), Color::TRANSPARENT);
    }
}
