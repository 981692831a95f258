//! Linear and radial gradients over the node's texture

use blinc_core::{normalize_rgba, Color, PackedColor, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::{Effect, EffectKind, UpdateContext};
use crate::error::{Result, ShaderError};
use crate::props::{self, ColorList, NumberList, PropType, PropValue};
use crate::sdf::{self, Fragment, Sample, MAX_STOPS};
use crate::shaders;
use crate::uniforms::{UniformDecl, UniformSet, UniformSink, UniformType};

const COLORS: UniformDecl = UniformDecl::new("colors", UniformType::Vec4Array(MAX_STOPS));
const STOPS: UniformDecl = UniformDecl::new("stops", UniformType::Vec4Array(MAX_STOPS / 4));
const STOP_COUNT: UniformDecl = UniformDecl::new("stop_count", UniformType::Int);

fn default_colors() -> ColorList {
    smallvec![0x000000ff, 0xffffffff]
}

fn default_stops() -> NumberList {
    smallvec![0.0, 1.0]
}

/// Stop positions for `count` colors
///
/// Explicit stops are used when there is one per color; otherwise the colors
/// are spread evenly over `[0, 1]`.
fn resolve_stops(stops: &[f32], count: usize) -> NumberList {
    if stops.len() == count {
        return stops.iter().copied().collect();
    }
    match count {
        0 => NumberList::new(),
        1 => smallvec![0.0],
        _ => (0..count).map(|i| i as f32 / (count - 1) as f32).collect(),
    }
}

fn validate_stops(kind: EffectKind, colors: &[PackedColor], stops: &[f32]) -> Result<()> {
    if colors.len() > MAX_STOPS || stops.len() > MAX_STOPS {
        return Err(ShaderError::InvalidProps {
            shader: kind.name().to_string(),
            message: format!(
                "at most {} color stops are supported, got {} colors and {} stops",
                MAX_STOPS,
                colors.len(),
                stops.len()
            ),
        });
    }
    if stops.iter().any(|t| !t.is_finite()) {
        return Err(ShaderError::InvalidProps {
            shader: kind.name().to_string(),
            message: "gradient stops must be finite".to_string(),
        });
    }
    Ok(())
}

/// Upload colors, packed stop positions and the stop count
fn write_stops(colors: &[PackedColor], stops: &[f32], sink: &mut dyn UniformSink) -> Result<()> {
    let count = colors.len().min(MAX_STOPS);
    let normalized: SmallVec<[[f32; 4]; MAX_STOPS]> =
        colors[..count].iter().map(|c| normalize_rgba(*c)).collect();

    let mut packed = [[0.0f32; 4]; MAX_STOPS / 4];
    for (i, t) in resolve_stops(stops, count).iter().enumerate() {
        packed[i / 4][i % 4] = *t;
    }

    sink.uniform_4fa("colors", &normalized)?;
    sink.uniform_4fa("stops", &packed)?;
    sink.uniform_1i("stop_count", count as i32)
}

fn read_gradient(uniforms: &UniformSet, t: f32) -> Result<Color> {
    Ok(sdf::gradient_color(
        uniforms.vec4_array("colors")?,
        uniforms.vec4_array("stops")?,
        uniforms.int("stop_count")?.max(0) as usize,
        t,
    ))
}

/// Gradient colors laid over the fill by their own alpha
fn blend(s: &Sample, gradient: Color) -> Color {
    s.finish(Color::lerp(&s.fill, &gradient, gradient.a))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinearGradientProps {
    pub colors: ColorList,
    pub stops: NumberList,
    /// Radians; 0 runs bottom to top, increasing clockwise
    pub angle: f32,
}

impl Default for LinearGradientProps {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            stops: default_stops(),
            angle: 0.0,
        }
    }
}

impl Effect for LinearGradientProps {
    const KIND: EffectKind = EffectKind::LinearGradient;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("colors", PropType::ColorList),
        ("stops", PropType::NumberList),
        ("angle", PropType::Number),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[
        COLORS,
        STOPS,
        STOP_COUNT,
        UniformDecl::new("angle", UniformType::Float),
    ];
    const FRAGMENT: &'static str = shaders::LINEAR_GRADIENT_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "colors" => Some(PropValue::ColorList(self.colors.to_vec())),
            "stops" => Some(PropValue::NumberList(self.stops.to_vec())),
            "angle" => Some(PropValue::Number(self.angle)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "colors" => self.colors = props::color_list(Self::KIND, name, value)?,
            "stops" => self.stops = props::number_list(Self::KIND, name, value)?,
            "angle" => self.angle = props::number(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_stops(Self::KIND, &self.colors, &self.stops)
    }

    fn update(&self, _ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_stops(&self.colors, &self.stops, sink)?;
        sink.uniform_1f("angle", self.angle)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let angle = uniforms.float("angle")?;

        let dir = Vec2::new(angle.sin(), -angle.cos());
        let half_len = ((s.half.x * dir.x).abs() + (s.half.y * dir.y).abs()).max(0.0001);
        let t = ((s.p.dot(dir) / half_len + 1.0) * 0.5).clamp(0.0, 1.0);

        Ok(blend(&s, read_gradient(uniforms, t)?))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RadialGradientProps {
    pub colors: ColorList,
    pub stops: NumberList,
    /// Horizontal radius; 0 uses half the node width
    pub width: f32,
    /// Vertical radius; 0 uses half the node height
    pub height: f32,
    /// Center as a fraction of the node size
    pub pivot: [f32; 2],
}

impl Default for RadialGradientProps {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            stops: default_stops(),
            width: 0.0,
            height: 0.0,
            pivot: [0.5, 0.5],
        }
    }
}

impl Effect for RadialGradientProps {
    const KIND: EffectKind = EffectKind::RadialGradient;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("colors", PropType::ColorList),
        ("stops", PropType::NumberList),
        ("width", PropType::Number),
        ("height", PropType::Number),
        ("pivot", PropType::Vec2),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[
        COLORS,
        STOPS,
        STOP_COUNT,
        UniformDecl::new("radii", UniformType::Vec2),
        UniformDecl::new("pivot", UniformType::Vec2),
    ];
    const FRAGMENT: &'static str = shaders::RADIAL_GRADIENT_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "colors" => Some(PropValue::ColorList(self.colors.to_vec())),
            "stops" => Some(PropValue::NumberList(self.stops.to_vec())),
            "width" => Some(PropValue::Number(self.width)),
            "height" => Some(PropValue::Number(self.height)),
            "pivot" => Some(PropValue::Vec2(self.pivot)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "colors" => self.colors = props::color_list(Self::KIND, name, value)?,
            "stops" => self.stops = props::number_list(Self::KIND, name, value)?,
            "width" => self.width = props::number(Self::KIND, name, value)?,
            "height" => self.height = props::number(Self::KIND, name, value)?,
            "pivot" => self.pivot = props::vec2(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_stops(Self::KIND, &self.colors, &self.stops)
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_stops(&self.colors, &self.stops, sink)?;
        let or_half = |radius: f32, extent: f32| if radius > 0.0 { radius } else { extent * 0.5 };
        sink.uniform_2f(
            "radii",
            [or_half(self.width, ctx.width()), or_half(self.height, ctx.height())],
        )?;
        sink.uniform_2f("pivot", self.pivot)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let [px, py] = uniforms.vec2("pivot")?;
        let [rx, ry] = uniforms.vec2("radii")?;

        let center = Vec2::new(px * s.dims.x, py * s.dims.y);
        let d = s.node_coords - center;
        let t = Vec2::new(d.x / rx.max(0.0001), d.y / ry.max(0.0001))
            .length()
            .clamp(0.0, 1.0);

        Ok(blend(&s, read_gradient(uniforms, t)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{record, shade_at};
    use blinc_core::Size;

    const SIZE: Size = Size::new(100.0, 100.0);

    #[test]
    fn test_stops_spread_evenly_when_missing() {
        assert_eq!(resolve_stops(&[], 3).as_slice(), &[0.0, 0.5, 1.0]);
        assert_eq!(resolve_stops(&[0.0, 1.0], 3).as_slice(), &[0.0, 0.5, 1.0]);
        assert_eq!(resolve_stops(&[0.2, 0.4], 2).as_slice(), &[0.2, 0.4]);
        assert_eq!(resolve_stops(&[], 1).as_slice(), &[0.0]);
    }

    #[test]
    fn test_stops_are_packed_four_per_vec4() {
        let props = LinearGradientProps {
            colors: smallvec![0xff0000ff, 0x00ff00ff, 0x0000ffff, 0xffffffff, 0x000000ff],
            stops: smallvec![0.0, 0.1, 0.2, 0.3, 1.0],
            angle: 0.0,
        };
        let set = record(&props, SIZE);
        assert_eq!(set.int("stop_count").unwrap(), 5);
        let stops = set.vec4_array("stops").unwrap();
        assert_eq!(stops[0], [0.0, 0.1, 0.2, 0.3]);
        assert_eq!(stops[1], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(set.vec4_array("colors").unwrap()[0], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_too_many_colors_is_rejected() {
        let props = LinearGradientProps {
            colors: (0..9).map(|_| 0xffffffff).collect(),
            ..Default::default()
        };
        assert!(matches!(
            props.validate(),
            Err(ShaderError::InvalidProps { .. })
        ));
    }

    #[test]
    fn test_linear_gradient_runs_bottom_to_top() {
        let props = LinearGradientProps::default();
        let top = shade_at(&props, SIZE, Vec2::new(50.0, 0.0), Color::BLACK);
        let bottom = shade_at(&props, SIZE, Vec2::new(50.0, 100.0), Color::BLACK);
        assert_eq!(top, Color::WHITE);
        assert_eq!(bottom, Color::BLACK);
    }

    #[test]
    fn test_radial_gradient_defaults_to_half_the_node() {
        let props = RadialGradientProps::default();
        let set = record(&props, Size::new(200.0, 100.0));
        assert_eq!(set.vec2("radii").unwrap(), [100.0, 50.0]);

        let center = shade_at(&props, SIZE, Vec2::new(50.0, 50.0), Color::WHITE);
        let edge = shade_at(&props, SIZE, Vec2::new(100.0, 50.0), Color::WHITE);
        assert_eq!(center, Color::BLACK);
        assert_eq!(edge, Color::WHITE);
    }
}
