//! Rounded corners, optionally combined with a border and a drop shadow

use blinc_core::{Color, CornerRadius, EdgeWidths, PackedColor, Vec4};
use serde::{Deserialize, Serialize};

use super::{Effect, EffectKind, UpdateContext};
use crate::error::Result;
use crate::math::{all_equal, factor_radius};
use crate::props::{self, PropType, PropValue};
use crate::sdf::{self, Fragment, Sample};
use crate::shaders::{self, VertexStage};
use crate::uniforms::{UniformDecl, UniformSet, UniformSink, UniformType};

const DEFAULT_RADIUS: f32 = 10.0;
const DEFAULT_BORDER_WIDTH: f32 = 10.0;
const DEFAULT_BORDER_COLOR: PackedColor = 0xffffffff;
const DEFAULT_SHADOW_COLOR: PackedColor = 0x000000ff;
const DEFAULT_SHADOW_PROJECTION: Vec4 = [0.0, 0.0, 50.0, 10.0];

const RADIUS: UniformDecl = UniformDecl::new("radius", UniformType::Vec4);
const BORDER_WIDTH: UniformDecl = UniformDecl::new("border_width", UniformType::Vec4);
const BORDER_COLOR: UniformDecl = UniformDecl::new("border_color", UniformType::Vec4);
const BORDER_ASYM: UniformDecl = UniformDecl::new("border_asym", UniformType::Int);
const SHADOW_COLOR: UniformDecl = UniformDecl::new("shadow_color", UniformType::Vec4);
const SHADOW: UniformDecl = UniformDecl::new("shadow", UniformType::Vec4);

pub(super) fn write_radius(
    ctx: &UpdateContext,
    radius: &CornerRadius,
    sink: &mut dyn UniformSink,
) -> Result<()> {
    sink.uniform_4f(
        "radius",
        factor_radius(radius.to_array(), ctx.width(), ctx.height()),
    )
}

/// Border uniforms; `border_asym` selects the per-edge path
pub(super) fn write_border(
    width: &EdgeWidths,
    color: PackedColor,
    sink: &mut dyn UniformSink,
) -> Result<()> {
    let width = width.to_array();
    sink.uniform_4f("border_width", width)?;
    sink.uniform_rgba("border_color", color)?;
    sink.uniform_1i("border_asym", if all_equal(&width) { 0 } else { 1 })
}

pub(super) fn write_shadow(
    color: PackedColor,
    projection: Vec4,
    sink: &mut dyn UniformSink,
) -> Result<()> {
    sink.uniform_rgba("shadow_color", color)?;
    sink.uniform_4f("shadow", projection)
}

struct Layers {
    border: bool,
    shadow: bool,
}

/// CPU counterpart of the four rounded fragment stages
fn shade_rounded(uniforms: &UniformSet, frag: &Fragment, layers: Layers) -> Result<Color> {
    let s = Sample::read(uniforms, frag)?;
    let r = uniforms.vec4("radius")?;

    let outer_dist = sdf::rounded_box(s.p, s.half, r);
    let rounded = sdf::rounded_coverage(outer_dist, s.aa);

    let (border_color, border) = if layers.border {
        let coverage = sdf::border_coverage(
            s.p,
            outer_dist,
            r,
            uniforms.vec4("border_width")?,
            uniforms.int("border_asym")? == 1,
            s.dims,
            s.aa,
        );
        (Color::from_array(uniforms.vec4("border_color")?), coverage)
    } else {
        (Color::TRANSPARENT, 0.0)
    };

    let (shadow_color, shadow) = if layers.shadow {
        let coverage = sdf::shadow_coverage(s.p, s.half, r, uniforms.vec4("shadow")?, s.aa);
        (Color::from_array(uniforms.vec4("shadow_color")?), coverage)
    } else {
        (Color::TRANSPARENT, 0.0)
    };

    Ok(s.finish(sdf::composite(
        shadow_color,
        shadow,
        s.fill,
        rounded,
        border_color,
        border,
    )))
}

/// Rounded corners
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RoundedProps {
    pub radius: CornerRadius,
}

impl Default for RoundedProps {
    fn default() -> Self {
        Self {
            radius: CornerRadius::uniform(DEFAULT_RADIUS),
        }
    }
}

impl Effect for RoundedProps {
    const KIND: EffectKind = EffectKind::Rounded;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[("radius", PropType::Vec4)];
    const UNIFORMS: &'static [UniformDecl] = &[RADIUS];
    const FRAGMENT: &'static str = shaders::ROUNDED_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "radius" => Some(PropValue::Vec4(self.radius.to_array())),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "radius" => self.radius = props::vec4(Self::KIND, name, value)?.into(),
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_radius(ctx, &self.radius, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        shade_rounded(uniforms, frag, Layers { border: false, shadow: false })
    }
}

/// Rounded corners with a border inside the silhouette
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RoundedWithBorderProps {
    pub radius: CornerRadius,
    pub border_width: EdgeWidths,
    pub border_color: PackedColor,
}

impl Default for RoundedWithBorderProps {
    fn default() -> Self {
        Self {
            radius: CornerRadius::uniform(DEFAULT_RADIUS),
            border_width: EdgeWidths::uniform(DEFAULT_BORDER_WIDTH),
            border_color: DEFAULT_BORDER_COLOR,
        }
    }
}

impl Effect for RoundedWithBorderProps {
    const KIND: EffectKind = EffectKind::RoundedWithBorder;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("radius", PropType::Vec4),
        ("border-width", PropType::Vec4),
        ("border-color", PropType::Color),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[RADIUS, BORDER_WIDTH, BORDER_COLOR, BORDER_ASYM];
    const FRAGMENT: &'static str = shaders::ROUNDED_WITH_BORDER_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "radius" => Some(PropValue::Vec4(self.radius.to_array())),
            "border-width" => Some(PropValue::Vec4(self.border_width.to_array())),
            "border-color" => Some(PropValue::Color(self.border_color)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "radius" => self.radius = props::vec4(Self::KIND, name, value)?.into(),
            "border-width" => self.border_width = props::vec4(Self::KIND, name, value)?.into(),
            "border-color" => self.border_color = props::color(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_radius(ctx, &self.radius, sink)?;
        write_border(&self.border_width, self.border_color, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        shade_rounded(uniforms, frag, Layers { border: true, shadow: false })
    }
}

/// Rounded corners with a drop shadow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RoundedWithShadowProps {
    pub radius: CornerRadius,
    pub shadow_color: PackedColor,
    /// `(offset-x, offset-y, blur, spread)`
    pub shadow_projection: Vec4,
}

impl Default for RoundedWithShadowProps {
    fn default() -> Self {
        Self {
            radius: CornerRadius::uniform(DEFAULT_RADIUS),
            shadow_color: DEFAULT_SHADOW_COLOR,
            shadow_projection: DEFAULT_SHADOW_PROJECTION,
        }
    }
}

impl Effect for RoundedWithShadowProps {
    const KIND: EffectKind = EffectKind::RoundedWithShadow;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("radius", PropType::Vec4),
        ("shadow-color", PropType::Color),
        ("shadow-projection", PropType::Vec4),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[RADIUS, SHADOW_COLOR, SHADOW];
    const FRAGMENT: &'static str = shaders::ROUNDED_WITH_SHADOW_FRAGMENT;
    const VERTEX: &'static VertexStage = &VertexStage::SHADOW;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "radius" => Some(PropValue::Vec4(self.radius.to_array())),
            "shadow-color" => Some(PropValue::Color(self.shadow_color)),
            "shadow-projection" => Some(PropValue::Vec4(self.shadow_projection)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "radius" => self.radius = props::vec4(Self::KIND, name, value)?.into(),
            "shadow-color" => self.shadow_color = props::color(Self::KIND, name, value)?,
            "shadow-projection" => self.shadow_projection = props::vec4(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_radius(ctx, &self.radius, sink)?;
        write_shadow(self.shadow_color, self.shadow_projection, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        shade_rounded(uniforms, frag, Layers { border: false, shadow: true })
    }
}

/// Rounded corners, border and drop shadow in one pass
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RoundedWithBorderAndShadowProps {
    pub radius: CornerRadius,
    pub border_width: EdgeWidths,
    pub border_color: PackedColor,
    pub shadow_color: PackedColor,
    pub shadow_projection: Vec4,
}

impl Default for RoundedWithBorderAndShadowProps {
    fn default() -> Self {
        Self {
            radius: CornerRadius::uniform(DEFAULT_RADIUS),
            border_width: EdgeWidths::uniform(DEFAULT_BORDER_WIDTH),
            border_color: DEFAULT_BORDER_COLOR,
            shadow_color: DEFAULT_SHADOW_COLOR,
            shadow_projection: DEFAULT_SHADOW_PROJECTION,
        }
    }
}

impl Effect for RoundedWithBorderAndShadowProps {
    const KIND: EffectKind = EffectKind::RoundedWithBorderAndShadow;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("radius", PropType::Vec4),
        ("border-width", PropType::Vec4),
        ("border-color", PropType::Color),
        ("shadow-color", PropType::Color),
        ("shadow-projection", PropType::Vec4),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[
        RADIUS,
        BORDER_WIDTH,
        BORDER_COLOR,
        BORDER_ASYM,
        SHADOW_COLOR,
        SHADOW,
    ];
    const FRAGMENT: &'static str = shaders::ROUNDED_WITH_BORDER_AND_SHADOW_FRAGMENT;
    const VERTEX: &'static VertexStage = &VertexStage::SHADOW;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "radius" => Some(PropValue::Vec4(self.radius.to_array())),
            "border-width" => Some(PropValue::Vec4(self.border_width.to_array())),
            "border-color" => Some(PropValue::Color(self.border_color)),
            "shadow-color" => Some(PropValue::Color(self.shadow_color)),
            "shadow-projection" => Some(PropValue::Vec4(self.shadow_projection)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "radius" => self.radius = props::vec4(Self::KIND, name, value)?.into(),
            "border-width" => self.border_width = props::vec4(Self::KIND, name, value)?.into(),
            "border-color" => self.border_color = props::color(Self::KIND, name, value)?,
            "shadow-color" => self.shadow_color = props::color(Self::KIND, name, value)?,
            "shadow-projection" => self.shadow_projection = props::vec4(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        write_radius(ctx, &self.radius, sink)?;
        write_border(&self.border_width, self.border_color, sink)?;
        write_shadow(self.shadow_color, self.shadow_projection, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        shade_rounded(uniforms, frag, Layers { border: true, shadow: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{record, shade_at, shade_with};
    use crate::effects::RenderOpProps;
    use crate::error::ShaderError;
    use blinc_core::{Size, Vec2};

    #[test]
    fn test_update_factors_radius_against_node_size() {
        let props = RoundedProps {
            radius: CornerRadius::uniform(80.0),
        };
        let set = record(&props, Size::new(100.0, 100.0));
        assert_eq!(set.vec4("radius").unwrap(), [50.0; 4]);
    }

    #[test]
    fn test_border_asym_flag() {
        let mut props = RoundedWithBorderProps::default();
        let set = record(&props, Size::new(200.0, 100.0));
        assert_eq!(set.int("border_asym").unwrap(), 0);

        props.border_width = EdgeWidths::new(4.0, 8.0, 4.0, 8.0);
        let set = record(&props, Size::new(200.0, 100.0));
        assert_eq!(set.int("border_asym").unwrap(), 1);
        assert_eq!(set.vec4("border_width").unwrap(), [4.0, 8.0, 4.0, 8.0]);
    }

    #[test]
    fn test_set_expands_scalar_radius() {
        let mut props = RoundedWithBorderAndShadowProps::default();
        props.set("radius", PropValue::Number(6.0)).unwrap();
        assert_eq!(props.radius, CornerRadius::uniform(6.0));
        props.set("border-color", PropValue::Color(0xff0000ff)).unwrap();
        assert_eq!(props.get("border-color"), Some(PropValue::Color(0xff0000ff)));
    }

    #[test]
    fn test_set_rejects_undeclared_property() {
        let mut props = RoundedProps::default();
        assert_eq!(
            props.set("border-width", PropValue::Number(2.0)),
            Err(ShaderError::UnknownProperty {
                shader: "Rounded".to_string(),
                property: "border-width".to_string(),
            })
        );
    }

    #[test]
    fn test_rounded_clears_outside_corners() {
        let props = RoundedProps::default();
        let size = Size::new(200.0, 100.0);
        // top-left pixel lies outside the 10 px corner
        let corner = shade_at(&props, size, Vec2::new(0.5, 0.5), Color::WHITE);
        assert_eq!(corner.a, 0.0);
        let center = shade_at(&props, size, Vec2::new(100.0, 50.0), Color::WHITE);
        assert_eq!(center, Color::WHITE);
    }

    #[test]
    fn test_shadow_visible_outside_the_node() {
        let props = RoundedWithShadowProps {
            shadow_projection: [10.0, 10.0, 0.0, 0.0],
            ..Default::default()
        };
        let size = Size::new(100.0, 100.0);
        // beyond the node's bottom-right edge but inside the offset shadow
        let c = shade_at(&props, size, Vec2::new(105.0, 105.0), Color::WHITE);
        assert_eq!(c, Color::BLACK);
    }

    #[test]
    fn test_edge_band_scales_with_pixel_ratio() {
        let props = RoundedProps::default();
        let size = Size::new(100.0, 100.0);
        // 1.5 units outside the right edge
        let at = Vec2::new(101.5, 50.0);

        let sharp = RenderOpProps {
            pixel_ratio: 1.0,
            ..Default::default()
        };
        let soft = RenderOpProps {
            pixel_ratio: 3.0,
            ..Default::default()
        };

        assert_eq!(shade_with(&props, size, &sharp, at, Color::WHITE), Color::TRANSPARENT);
        assert_eq!(
            shade_with(&props, size, &soft, at, Color::WHITE),
            Color::rgba(0.5, 0.5, 0.5, 0.5)
        );
    }
}
