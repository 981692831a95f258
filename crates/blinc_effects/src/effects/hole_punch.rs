//! Transparent rounded-rectangle hole cut out of the node

use blinc_core::{Color, CornerRadius, Size, Vec2};
use serde::{Deserialize, Serialize};

use super::rounded::write_radius;
use super::{Effect, EffectKind, UpdateContext};
use crate::error::{Result, ShaderError};
use crate::props::{self, PropType, PropValue};
use crate::sdf::{self, Fragment, Sample};
use crate::shaders;
use crate::uniforms::{UniformDecl, UniformSet, UniformSink, UniformType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HolePunchProps {
    /// Hole's top-left corner in node space
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: CornerRadius,
}

impl Default for HolePunchProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
            radius: CornerRadius::ZERO,
        }
    }
}

impl Effect for HolePunchProps {
    const KIND: EffectKind = EffectKind::HolePunch;
    const PROPERTIES: &'static [(&'static str, PropType)] = &[
        ("x", PropType::Number),
        ("y", PropType::Number),
        ("width", PropType::Number),
        ("height", PropType::Number),
        ("radius", PropType::Vec4),
    ];
    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new("hole", UniformType::Vec4),
        UniformDecl::new("radius", UniformType::Vec4),
    ];
    const FRAGMENT: &'static str = shaders::HOLE_PUNCH_FRAGMENT;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "x" => Some(PropValue::Number(self.x)),
            "y" => Some(PropValue::Number(self.y)),
            "width" => Some(PropValue::Number(self.width)),
            "height" => Some(PropValue::Number(self.height)),
            "radius" => Some(PropValue::Vec4(self.radius.to_array())),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "x" => self.x = props::number(Self::KIND, name, value)?,
            "y" => self.y = props::number(Self::KIND, name, value)?,
            "width" => self.width = props::number(Self::KIND, name, value)?,
            "height" => self.height = props::number(Self::KIND, name, value)?,
            "radius" => self.radius = props::vec4(Self::KIND, name, value)?.into(),
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width < 0.0 || self.height < 0.0 {
            return Err(ShaderError::InvalidProps {
                shader: Self::KIND.name().to_string(),
                message: format!(
                    "hole ({}, {}, {}x{}) must be finite with a non-negative size",
                    self.x, self.y, self.width, self.height
                ),
            });
        }
        Ok(())
    }

    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        sink.uniform_4f("hole", [self.x, self.y, self.width, self.height])?;
        // Radii are factored against the hole, not the node
        let hole = UpdateContext {
            size: Size::new(self.width, self.height),
            op: ctx.op.clone(),
        };
        write_radius(&hole, &self.radius, sink)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let [x, y, w, h] = uniforms.vec4("hole")?;
        let half = Vec2::new(w, h) * 0.5;
        let p = s.node_coords - (Vec2::new(x, y) + half);

        let dist = sdf::rounded_box(p, half, uniforms.vec4("radius")?);
        let hole = sdf::rounded_coverage(dist, s.aa);
        Ok(s.finish(Color::lerp(&s.fill, &Color::TRANSPARENT, hole)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{record, shade_at};

    #[test]
    fn test_hole_is_transparent_and_rest_is_kept() {
        let props = HolePunchProps {
            x: 20.0,
            y: 20.0,
            width: 40.0,
            height: 40.0,
            radius: CornerRadius::ZERO,
        };
        let size = Size::new(100.0, 100.0);
        let fill = Color::rgba(0.0, 0.5, 1.0, 1.0);
        assert_eq!(shade_at(&props, size, Vec2::new(40.0, 40.0), fill).a, 0.0);
        assert_eq!(shade_at(&props, size, Vec2::new(80.0, 80.0), fill), fill);
        assert_eq!(shade_at(&props, size, Vec2::new(10.0, 40.0), fill), fill);
    }

    #[test]
    fn test_radius_is_factored_against_the_hole() {
        let props = HolePunchProps {
            width: 20.0,
            height: 20.0,
            radius: CornerRadius::uniform(30.0),
            ..Default::default()
        };
        let set = record(&props, Size::new(500.0, 500.0));
        assert_eq!(set.vec4("radius").unwrap(), [10.0; 4]);
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let props = HolePunchProps {
            width: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            props.validate(),
            Err(ShaderError::InvalidProps { .. })
        ));
    }
}
