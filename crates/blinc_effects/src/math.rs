//! Uniform-side helpers shared by every effect
//!
//! These run on the CPU once per `update`, turning props into values the
//! fragment stage can use without further checks.

use blinc_core::Vec4;

/// Whether all four components are identical
///
/// Chooses between the symmetric and per-edge border paths. Any `NaN`
/// component compares unequal and therefore selects the per-edge path.
#[inline]
pub fn all_equal(values: &Vec4) -> bool {
    values[1..].iter().all(|v| *v == values[0])
}

/// Scale corner radii so adjacent corners never overlap
///
/// Radii are `(top-left, top-right, bottom-right, bottom-left)`. All four are
/// scaled by one factor so that the two radii sharing an edge sum to at most
/// that edge's length; radii that already fit are returned unchanged.
/// Each corner is then capped at half the shorter side, so a single
/// oversized corner cannot push its arc center past the node center.
/// Negative or non-finite radii count as zero, and degenerate geometry
/// (non-positive or non-finite width/height) yields zero radii rather than
/// `NaN`.
pub fn factor_radius(radius: Vec4, width: f32, height: f32) -> Vec4 {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return [0.0; 4];
    }

    let r = radius.map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 });
    let [tl, tr, br, bl] = r;

    let fit = |edge: f32, sum: f32| edge / edge.max(sum);
    let factor = fit(width, tl + tr)
        .min(fit(width, br + bl))
        .min(fit(height, tl + bl))
        .min(fit(height, tr + br))
        .min(1.0);

    let max_corner = width.min(height) * 0.5;
    r.map(|v| (v * factor).min(max_corner))
}

/// Hermite interpolation between two edges, as `smoothstep` in WGSL
///
/// Callers keep `edge0 != edge1`; equal edges collapse to a hard step here
/// instead of dividing by zero.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
