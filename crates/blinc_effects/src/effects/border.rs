//! Borders on square-cornered nodes

use blinc_core::{Color, CornerRadius, EdgeWidths, PackedColor, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::rounded::write_border;
use super::{Effect, EffectKind, UpdateContext};
use crate::error::Result;
use crate::props::{self, PropType, PropValue};
use crate::sdf::{self, Fragment, Sample};
use crate::shaders;
use crate::uniforms::{UniformDecl, UniformSet, UniformSink, UniformType};

const DEFAULT_WIDTH: f32 = 10.0;
const DEFAULT_COLOR: PackedColor = 0xffffffff;

/// Border on all four edges, uniform or per edge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BorderProps {
    /// `(top, right, bottom, left)`
    pub width: EdgeWidths,
    pub color: PackedColor,
}

impl Default for BorderProps {
    fn default() -> Self {
        Self {
            width: EdgeWidths::uniform(DEFAULT_WIDTH),
            color: DEFAULT_COLOR,
        }
    }
}

impl Effect for BorderProps {
    const KIND: EffectKind = EffectKind::Border;
    const PROPERTIES: &'static [(&'static str, PropType)] =
        &[("width", PropType::Vec4), ("color", PropType::Color)];
    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new("border_width", UniformType::Vec4),
        UniformDecl::new("border_color", UniformType::Vec4),
        UniformDecl::new("border_asym", UniformType::Int),
    ];
    const FRAGMENT: &'static str = shaders::BORDER_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "width" => Some(PropValue::Vec4(self.width.to_array())),
            "color" => Some(PropValue::Color(self.color)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "width" => self.width = props::vec4(Self::KIND, name, value)?.into(),
            "color" => self.color = props::color(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, _ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_border(&self.width, self.color, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let square = CornerRadius::ZERO.to_array();

        let outer_dist = sdf::rounded_box(s.p, s.half, square);
        let rounded = sdf::rounded_coverage(outer_dist, s.aa);
        let border = sdf::border_coverage(
            s.p,
            outer_dist,
            square,
            uniforms.vec4("border_width")?,
            uniforms.int("border_asym")? == 1,
            s.dims,
            s.aa,
        );
        let border_color = Color::from_array(uniforms.vec4("border_color")?);

        Ok(s.finish(sdf::composite(
            Color::TRANSPARENT,
            0.0,
            s.fill,
            rounded,
            border_color,
            border,
        )))
    }
}

pub const SIDE_TOP: u8 = 0;
pub const SIDE_RIGHT: u8 = 1;
pub const SIDE_BOTTOM: u8 = 2;
pub const SIDE_LEFT: u8 = 3;

/// Border along a single edge
///
/// `SIDE` is one of [`SIDE_TOP`], [`SIDE_RIGHT`], [`SIDE_BOTTOM`] or
/// [`SIDE_LEFT`]; use the aliases below.
#[derive(Clone, Debug, PartialEq)]
pub struct BorderSideProps<const SIDE: u8> {
    pub width: f32,
    pub color: PackedColor,
}

/// Serialized form shared by every side; serde derives cannot take the
/// const parameter
#[derive(Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct SideFields {
    width: f32,
    color: PackedColor,
}

impl Default for SideFields {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            color: DEFAULT_COLOR,
        }
    }
}

impl<const SIDE: u8> Serialize for BorderSideProps<SIDE> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SideFields {
            width: self.width,
            color: self.color,
        }
        .serialize(serializer)
    }
}

impl<'de, const SIDE: u8> Deserialize<'de> for BorderSideProps<SIDE> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = SideFields::deserialize(deserializer)?;
        Ok(Self {
            width: fields.width,
            color: fields.color,
        })
    }
}

pub type BorderTopProps = BorderSideProps<SIDE_TOP>;
pub type BorderRightProps = BorderSideProps<SIDE_RIGHT>;
pub type BorderBottomProps = BorderSideProps<SIDE_BOTTOM>;
pub type BorderLeftProps = BorderSideProps<SIDE_LEFT>;

impl<const SIDE: u8> Default for BorderSideProps<SIDE> {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            color: DEFAULT_COLOR,
        }
    }
}

/// Center and half-size of the band covering one edge
fn side_band(side: i32, dims: Vec2, width: f32) -> (Vec2, Vec2) {
    let half_w = width * 0.5;
    match side {
        0 => (Vec2::new(dims.x * 0.5, half_w), Vec2::new(dims.x * 0.5, half_w)),
        1 => (
            Vec2::new(dims.x - half_w, dims.y * 0.5),
            Vec2::new(half_w, dims.y * 0.5),
        ),
        2 => (
            Vec2::new(dims.x * 0.5, dims.y - half_w),
            Vec2::new(dims.x * 0.5, half_w),
        ),
        _ => (Vec2::new(half_w, dims.y * 0.5), Vec2::new(half_w, dims.y * 0.5)),
    }
}

impl<const SIDE: u8> Effect for BorderSideProps<SIDE> {
    const KIND: EffectKind = match SIDE {
        SIDE_TOP => EffectKind::BorderTop,
        SIDE_RIGHT => EffectKind::BorderRight,
        SIDE_BOTTOM => EffectKind::BorderBottom,
        _ => EffectKind::BorderLeft,
    };
    const PROPERTIES: &'static [(&'static str, PropType)] =
        &[("width", PropType::Number), ("color", PropType::Color)];
    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new("width", UniformType::Float),
        UniformDecl::new("color", UniformType::Vec4),
        UniformDecl::new("side", UniformType::Int),
    ];
    const FRAGMENT: &'static str = shaders::BORDER_SIDE_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "width" => Some(PropValue::Number(self.width)),
            "color" => Some(PropValue::Color(self.color)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "width" => self.width = props::number(Self::KIND, name, value)?,
            "color" => self.color = props::color(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, _ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        sink.uniform_1f("width", self.width)?;
        sink.uniform_rgba("color", self.color)?;
        sink.uniform_1i("side", SIDE as i32)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let width = uniforms.float("width")?.max(0.0);
        let color = Color::from_array(uniforms.vec4("color")?);
        let (center, half) = side_band(uniforms.int("side")?, s.dims, width);

        let edge = if width > 0.0 {
            let dist = sdf::rounded_box(s.node_coords - center, half, [0.0; 4]);
            sdf::rounded_coverage(dist, s.aa)
        } else {
            0.0
        };

        Ok(s.finish(Color::lerp(&s.fill, &color, color.a.min(edge))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::props_from_json;
    use crate::effects::testing::{record, shade_at};
    use blinc_core::Size;

    const SIZE: Size = Size::new(200.0, 100.0);

    #[test]
    fn test_side_kinds() {
        assert_eq!(BorderTopProps::KIND, EffectKind::BorderTop);
        assert_eq!(BorderRightProps::KIND, EffectKind::BorderRight);
        assert_eq!(BorderBottomProps::KIND, EffectKind::BorderBottom);
        assert_eq!(BorderLeftProps::KIND, EffectKind::BorderLeft);
    }

    #[test]
    fn test_side_uniform() {
        let set = record(&BorderLeftProps::default(), SIZE);
        assert_eq!(set.int("side").unwrap(), 3);
        assert_eq!(set.float("width").unwrap(), 10.0);
    }

    #[test]
    fn test_top_border_only_covers_top_edge() {
        let props = BorderTopProps {
            width: 4.0,
            color: 0xff0000ff,
        };
        let fill = Color::rgba(0.0, 0.0, 1.0, 1.0);
        assert_eq!(shade_at(&props, SIZE, Vec2::new(100.0, 1.0), fill), Color::RED);
        assert_eq!(shade_at(&props, SIZE, Vec2::new(100.0, 50.0), fill), fill);
        assert_eq!(shade_at(&props, SIZE, Vec2::new(100.0, 99.0), fill), fill);
    }

    #[test]
    fn test_zero_width_draws_nothing() {
        let props = BorderRightProps {
            width: 0.0,
            color: 0xff0000ff,
        };
        let fill = Color::WHITE;
        assert_eq!(shade_at(&props, SIZE, Vec2::new(199.5, 50.0), fill), fill);
    }

    #[test]
    fn test_side_props_from_json() {
        let json = serde_json::json!({ "width": 4, "color": 4278190335u32 });
        let props: BorderLeftProps = props_from_json(&json).unwrap();
        assert_eq!(
            props,
            BorderLeftProps {
                width: 4.0,
                color: 0xff0000ff,
            }
        );

        let partial: BorderBottomProps = props_from_json(&serde_json::json!({ "width": 2 })).unwrap();
        assert_eq!(partial.color, DEFAULT_COLOR);

        let back = serde_json::to_value(&props).unwrap();
        assert_eq!(back, serde_json::json!({ "width": 4.0, "color": 4278190335u32 }));
    }

    #[test]
    fn test_side_props_reject_unknown_keys() {
        let json = serde_json::json!({ "widht": 4 });
        assert!(props_from_json::<BorderTopProps>(&json).is_err());
        assert!(serde_json::from_value::<BorderTopProps>(json).is_err());
    }

    #[test]
    fn test_border_uses_per_edge_widths() {
        let props = BorderProps {
            width: EdgeWidths::new(2.0, 12.0, 2.0, 12.0),
            color: 0xff0000ff,
        };
        let fill = Color::rgba(0.0, 0.0, 1.0, 1.0);
        // 8 px inside the right edge is within its 12 px band
        assert_eq!(shade_at(&props, SIZE, Vec2::new(192.0, 50.0), fill), Color::RED);
        // 8 px below the top edge is past its 2 px band
        assert_eq!(shade_at(&props, SIZE, Vec2::new(100.0, 8.0), fill), fill);
    }
}
