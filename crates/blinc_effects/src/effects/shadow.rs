//! Drop shadow behind a square-cornered node

use blinc_core::{Color, PackedColor, Vec4};
use serde::{Deserialize, Serialize};

use super::{Effect, EffectKind, UpdateContext};
use crate::error::Result;
use crate::props::{self, PropType, PropValue};
use crate::sdf::{self, Fragment, Sample};
use crate::shaders::{self, VertexStage};
use crate::uniforms::{UniformDecl, UniformSet, UniformSink, UniformType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ShadowProps {
    pub color: PackedColor,
    /// `(offset-x, offset-y, blur, spread)`
    pub projection: Vec4,
}

impl Default for ShadowProps {
    fn default() -> Self {
        Self {
            color: 0x000000ff,
            projection: [0.0, 0.0, 50.0, 10.0],
        }
    }
}

impl Effect for ShadowProps {
    const KIND: EffectKind = EffectKind::Shadow;
    const PROPERTIES: &'static [(&'static str, PropType)] =
        &[("color", PropType::Color), ("projection", PropType::Vec4)];
    const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl::new("shadow_color", UniformType::Vec4),
        UniformDecl::new("shadow", UniformType::Vec4),
    ];
    const FRAGMENT: &'static str = shaders::SHADOW_FRAGMENT;
    const VERTEX: &'static VertexStage = &VertexStage::SHADOW;

    fn get(&self, name: &str) -> Option<PropValue> {
        match name {
            "color" => Some(PropValue::Color(self.color)),
            "projection" => Some(PropValue::Vec4(self.projection)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
        match name {
            "color" => self.color = props::color(Self::KIND, name, value)?,
            "projection" => self.projection = props::vec4(Self::KIND, name, value)?,
            _ => return Err(props::unknown_property(Self::KIND, name)),
        }
        Ok(())
    }

    fn update(&self, _ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
        sink.uniform_rgba("shadow_color", self.color)?;
        sink.uniform_4f("shadow", self.projection)
    }

    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
        let s = Sample::read(uniforms, frag)?;
        let square = [0.0; 4];

        let rounded = sdf::rounded_coverage(sdf::rounded_box(s.p, s.half, square), s.aa);
        let shadow = sdf::shadow_coverage(s.p, s.half, square, uniforms.vec4("shadow")?, s.aa);
        let shadow_color = Color::from_array(uniforms.vec4("shadow_color")?);

        Ok(s.finish(sdf::composite(
            shadow_color,
            shadow,
            s.fill,
            rounded,
            Color::TRANSPARENT,
            0.0,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::shade_at;
    use blinc_core::{Size, Vec2};

    #[test]
    fn test_shadow_fades_with_distance() {
        let props = ShadowProps::default();
        let size = Size::new(100.0, 100.0);
        let near = shade_at(&props, size, Vec2::new(110.0, 50.0), Color::WHITE);
        let far = shade_at(&props, size, Vec2::new(150.0, 50.0), Color::WHITE);
        assert!(near.a > far.a);
        assert!(far.a < 0.5);
        // the node itself is drawn over the shadow
        let inside = shade_at(&props, size, Vec2::new(50.0, 50.0), Color::WHITE);
        assert_eq!(inside, Color::WHITE);
    }
}
