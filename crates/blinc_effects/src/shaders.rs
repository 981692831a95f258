//! WGSL sources for the effect shaders
//!
//! A compiled effect module is assembled from four parts:
//!
//! 1. the `Uniforms` struct generated from the template's [`UniformLayout`]
//!    plus the fixed bind group (uniforms, node texture, sampler)
//! 2. a shared vertex stage ([`VertexStage::QUAD`] or [`VertexStage::SHADOW`])
//! 3. the SDF library ([`SDF_LIBRARY`])
//! 4. the effect's fragment stage
//!
//! Coordinates handed to the fragment stage are node-local pixels with the
//! origin at the node's top-left corner and y growing downward. Every
//! anti-aliasing band is `u.pixel_ratio` wide.

use crate::uniforms::UniformLayout;

/// A vertex stage shared by several effects
#[derive(Debug, PartialEq, Eq)]
pub struct VertexStage {
    pub name: &'static str,
    /// Effect uniforms the stage reads besides the built-in ones
    pub requires: &'static [&'static str],
    pub source: &'static str,
}

impl VertexStage {
    /// Covers exactly the node's rectangle
    pub const QUAD: VertexStage = VertexStage {
        name: "quad",
        requires: &[],
        source: QUAD_VERTEX,
    };

    /// Grows the node's rectangle to cover the shadow's offset, spread and blur
    pub const SHADOW: VertexStage = VertexStage {
        name: "shadow",
        requires: &["shadow"],
        source: SHADOW_VERTEX,
    };
}

/// Bindings shared by every effect module
const BINDINGS: &str = r#"
@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var t_node: texture_2d<f32>;
@group(0) @binding(2) var s_node: sampler;
"#;

/// Vertex output and quad emission shared by both vertex stages
const VERTEX_COMMON: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) node_coords: vec2<f32>,
    @location(1) tex_coords: vec2<f32>,
}

fn quad_corner(vertex_index: u32) -> vec2<f32> {
    // 0--1
    // |\ |
    // | \|
    // 3--2
    let quad_verts = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 1.0),
    );
    return quad_verts[vertex_index];
}

// Emits one corner of the node rectangle grown by grow_min (left/top) and
// grow_max (right/bottom).
fn emit_vertex(corner: vec2<f32>, grow_min: vec2<f32>, grow_max: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;

    let local = mix(-grow_min, u.dimensions + grow_max, corner);
    let world = u.position + local;
    let resolution = max(u.resolution, vec2<f32>(1.0));

    out.position = vec4<f32>(
        (world.x / resolution.x) * 2.0 - 1.0,
        1.0 - (world.y / resolution.y) * 2.0,
        0.0,
        1.0
    );
    out.node_coords = local;
    out.tex_coords = local / max(u.dimensions, vec2<f32>(0.0001));
    return out;
}
"#;

const QUAD_VERTEX: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    return emit_vertex(quad_corner(vertex_index), vec2<f32>(0.0), vec2<f32>(0.0));
}
"#;

const SHADOW_VERTEX: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    // Shadow coverage fades out over one blur radius past the spread box
    let reach = vec2<f32>(max(u.shadow.z, 0.0) * 2.0 + max(u.shadow.w, 0.0) + u.pixel_ratio);
    let grow_min = reach + max(-u.shadow.xy, vec2<f32>(0.0));
    let grow_max = reach + max(u.shadow.xy, vec2<f32>(0.0));
    return emit_vertex(quad_corner(vertex_index), grow_min, grow_max);
}
"#;

/// SDF primitives and coverage helpers
///
/// Radii are `(top-left, top-right, bottom-right, bottom-left)`, edge widths
/// `(top, right, bottom, left)`. `p` is relative to the box center.
pub const SDF_LIBRARY: &str = r#"
// Signed distance to a box of half-size s with per-corner radii r
fn rounded_box(p: vec2<f32>, s: vec2<f32>, r: vec4<f32>) -> f32 {
    let side = select(r.xw, r.yz, p.x > 0.0);
    let rc = select(side.x, side.y, p.y > 0.0);
    let q = abs(p) - s + vec2<f32>(rc);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - rc;
}

fn rounded_coverage(dist: f32, aa: f32) -> f32 {
    return 1.0 - smoothstep(0.0, aa, dist);
}

// Border band of a single width measured inward from the outer edge
fn sym_border_coverage(outer_dist: f32, width: f32, aa: f32) -> f32 {
    return 1.0 - smoothstep(width - aa, width, abs(outer_dist));
}

fn inner_radius(r: vec4<f32>, w: vec4<f32>) -> vec4<f32> {
    let adjacent = vec4<f32>(max(w.x, w.w), max(w.x, w.y), max(w.z, w.y), max(w.z, w.w));
    return max(r - adjacent, vec4<f32>(0.0));
}

// Border band with independent edge widths: inside the outer box and outside
// an inner box shrunk and re-centered by the widths
fn asym_border_coverage(p: vec2<f32>, outer_dist: f32, r: vec4<f32>, w: vec4<f32>, dims: vec2<f32>, aa: f32) -> f32 {
    let inner_half = max((dims - vec2<f32>(w.w + w.y, w.x + w.z)) * 0.5, vec2<f32>(0.0));
    let inner_center = vec2<f32>(w.w - w.y, w.x - w.z) * 0.5;
    let inner_dist = rounded_box(p - inner_center, inner_half, inner_radius(r, w));
    return 1.0 - smoothstep(0.0, aa, max(-inner_dist, outer_dist));
}

fn border_coverage(p: vec2<f32>, outer_dist: f32, r: vec4<f32>, w: vec4<f32>, asym: i32, dims: vec2<f32>, aa: f32) -> f32 {
    if asym == 1 {
        return asym_border_coverage(p, outer_dist, r, w, dims, aa);
    }
    return sym_border_coverage(outer_dist, w.x, aa);
}

// Soft shadow: the box moved by shadow.xy, grown by shadow.w, blurred over shadow.z
fn shadow_coverage(p: vec2<f32>, s: vec2<f32>, r: vec4<f32>, shadow: vec4<f32>, aa: f32) -> f32 {
    let blur = max(shadow.z, 0.0);
    let size = max(s + vec2<f32>(shadow.w), vec2<f32>(0.0));
    let dist = rounded_box(p - shadow.xy, size, r + vec4<f32>(blur));
    let band = max(blur, aa);
    return 1.0 - smoothstep(-band, band, dist);
}

// Back to front: shadow, fill, border; the border never leaves the silhouette
fn composite(shadow_color: vec4<f32>, shadow: f32, fill: vec4<f32>, rounded: f32, border_color: vec4<f32>, border: f32) -> vec4<f32> {
    var result = vec4<f32>(0.0);
    result = mix(result, shadow_color, shadow);
    result = mix(result, fill, min(fill.a, rounded));
    result = mix(result, border_color, min(border_color.a, min(border, rounded)));
    return result;
}
"#;

/// Gradient lookup shared by the linear and radial gradients
const GRADIENT_LIBRARY: &str = r#"
const MAX_STOPS: i32 = 8;

fn stop_at(i: i32) -> f32 {
    let packed = u.stops[i / 4];
    return packed[i % 4];
}

fn gradient_color(t: f32) -> vec4<f32> {
    let count = min(u.stop_count, MAX_STOPS);
    if count <= 0 {
        return vec4<f32>(0.0);
    }
    var color = u.colors[0];
    for (var i = 1; i < count; i++) {
        let t0 = stop_at(i - 1);
        let t1 = stop_at(i);
        let f = clamp((t - t0) / max(t1 - t0, 0.00001), 0.0, 1.0);
        color = mix(color, u.colors[i], f);
    }
    return color;
}
"#;

pub const ROUNDED_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;

    let rounded = rounded_coverage(rounded_box(p, half_size, u.radius), u.pixel_ratio);
    let result = mix(vec4<f32>(0.0), color, min(color.a, rounded));
    return result * u.alpha;
}
"#;

pub const ROUNDED_WITH_BORDER_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;
    let aa = u.pixel_ratio;

    let outer_dist = rounded_box(p, half_size, u.radius);
    let rounded = rounded_coverage(outer_dist, aa);
    let border = border_coverage(p, outer_dist, u.radius, u.border_width, u.border_asym, u.dimensions, aa);

    let result = composite(vec4<f32>(0.0), 0.0, color, rounded, u.border_color, border);
    return result * u.alpha;
}
"#;

pub const ROUNDED_WITH_SHADOW_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;
    let aa = u.pixel_ratio;

    let rounded = rounded_coverage(rounded_box(p, half_size, u.radius), aa);
    let shadow = shadow_coverage(p, half_size, u.radius, u.shadow, aa);

    let result = composite(u.shadow_color, shadow, color, rounded, vec4<f32>(0.0), 0.0);
    return result * u.alpha;
}
"#;

pub const ROUNDED_WITH_BORDER_AND_SHADOW_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;
    let aa = u.pixel_ratio;

    let outer_dist = rounded_box(p, half_size, u.radius);
    let rounded = rounded_coverage(outer_dist, aa);
    let border = border_coverage(p, outer_dist, u.radius, u.border_width, u.border_asym, u.dimensions, aa);
    let shadow = shadow_coverage(p, half_size, u.radius, u.shadow, aa);

    let result = composite(u.shadow_color, shadow, color, rounded, u.border_color, border);
    return result * u.alpha;
}
"#;

pub const BORDER_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;
    let aa = u.pixel_ratio;
    let square = vec4<f32>(0.0);

    let outer_dist = rounded_box(p, half_size, square);
    let rounded = rounded_coverage(outer_dist, aa);
    let border = border_coverage(p, outer_dist, square, u.border_width, u.border_asym, u.dimensions, aa);

    let result = composite(vec4<f32>(0.0), 0.0, color, rounded, u.border_color, border);
    return result * u.alpha;
}
"#;

pub const BORDER_SIDE_FRAGMENT: &str = r#"
// Center (xy) and half-size (zw) of the band along one edge:
// 0 = top, 1 = right, 2 = bottom, 3 = left
fn side_band(side: i32, dims: vec2<f32>, w: f32) -> vec4<f32> {
    var band = vec4<f32>(w * 0.5, dims.y * 0.5, w * 0.5, dims.y * 0.5);
    switch side {
        case 0: {
            band = vec4<f32>(dims.x * 0.5, w * 0.5, dims.x * 0.5, w * 0.5);
        }
        case 1: {
            band = vec4<f32>(dims.x - w * 0.5, dims.y * 0.5, w * 0.5, dims.y * 0.5);
        }
        case 2: {
            band = vec4<f32>(dims.x * 0.5, dims.y - w * 0.5, dims.x * 0.5, w * 0.5);
        }
        default: {}
    }
    return band;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let width = max(u.width, 0.0);
    let band = side_band(u.side, u.dimensions, width);

    let dist = rounded_box(in.node_coords - band.xy, band.zw, vec4<f32>(0.0));
    let edge = select(0.0, rounded_coverage(dist, u.pixel_ratio), width > 0.0);

    let result = mix(color, u.color, min(u.color.a, edge));
    return result * u.alpha;
}
"#;

pub const SHADOW_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;
    let aa = u.pixel_ratio;
    let square = vec4<f32>(0.0);

    let rounded = rounded_coverage(rounded_box(p, half_size, square), aa);
    let shadow = shadow_coverage(p, half_size, square, u.shadow, aa);

    let result = composite(u.shadow_color, shadow, color, rounded, vec4<f32>(0.0), 0.0);
    return result * u.alpha;
}
"#;

pub const HOLE_PUNCH_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let hole_half = u.hole.zw * 0.5;
    let p = in.node_coords - (u.hole.xy + hole_half);

    let hole = rounded_coverage(rounded_box(p, hole_half, u.radius), u.pixel_ratio);
    let result = mix(color, vec4<f32>(0.0), hole);
    return result * u.alpha;
}
"#;

pub const LINEAR_GRADIENT_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let half_size = u.dimensions * 0.5;
    let p = in.node_coords - half_size;

    // angle 0 points up, increasing clockwise
    let dir = vec2<f32>(sin(u.angle), -cos(u.angle));
    let half_len = max(abs(half_size.x * dir.x) + abs(half_size.y * dir.y), 0.0001);
    let t = clamp((dot(p, dir) / half_len + 1.0) * 0.5, 0.0, 1.0);

    let gradient = gradient_color(t);
    let result = mix(color, gradient, clamp(gradient.a, 0.0, 1.0));
    return result * u.alpha;
}
"#;

pub const RADIAL_GRADIENT_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(t_node, s_node, in.tex_coords) * u.tint;
    let center = u.pivot * u.dimensions;
    let radii = max(u.radii, vec2<f32>(0.0001));
    let t = clamp(length((in.node_coords - center) / radii), 0.0, 1.0);

    let gradient = gradient_color(t);
    let result = mix(color, gradient, clamp(gradient.a, 0.0, 1.0));
    return result * u.alpha;
}
"#;

/// Fragment stages that read the gradient uniforms
pub(crate) fn needs_gradient_library(fragment: &str) -> bool {
    fragment.contains("gradient_color(")
}

/// Assemble the complete WGSL module for one effect
pub fn compose_module(layout: &UniformLayout, vertex: &VertexStage, fragment: &str) -> String {
    let mut source = String::with_capacity(
        BINDINGS.len() + VERTEX_COMMON.len() + vertex.source.len() + SDF_LIBRARY.len() + fragment.len() + 1024,
    );
    source.push_str(&layout.wgsl_struct("Uniforms"));
    source.push_str(BINDINGS);
    source.push_str(VERTEX_COMMON);
    source.push_str(vertex.source);
    source.push_str(SDF_LIBRARY);
    if needs_gradient_library(fragment) {
        source.push_str(GRADIENT_LIBRARY);
    }
    source.push_str(fragment);
    source
}
