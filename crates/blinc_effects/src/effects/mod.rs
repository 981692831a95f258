//! Built-in effects
//!
//! Every effect is a typed props struct implementing [`Effect`]. The closed
//! set of effects is enumerated by [`EffectKind`] (what a template draws) and
//! [`EffectProps`] (the live values of one program), both generated by the
//! `effects!` table below so that adding an effect is one line here plus its
//! props type.

use std::fmt;
use std::str::FromStr;

use blinc_core::{Color, Point, Size};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ShaderError};
use crate::props::{PropType, PropValue, PropertyDecl, PropertySchema};
use crate::sdf::Fragment;
use crate::shaders::VertexStage;
use crate::uniforms::{UniformDecl, UniformLayout, UniformSet, UniformSink, UniformType};

mod border;
mod gradient;
mod hole_punch;
mod rounded;
mod shadow;

pub use border::{
    BorderBottomProps, BorderLeftProps, BorderProps, BorderRightProps, BorderSideProps,
    BorderTopProps,
};
pub use gradient::{LinearGradientProps, RadialGradientProps};
pub use hole_punch::HolePunchProps;
pub use rounded::{
    RoundedProps, RoundedWithBorderAndShadowProps, RoundedWithBorderProps, RoundedWithShadowProps,
};
pub use shadow::ShadowProps;

/// Per-draw values supplied by the render operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOpProps {
    /// Device pixels per logical pixel; also the anti-aliasing band width
    pub pixel_ratio: f32,
    /// Node world alpha
    pub alpha: f32,
    /// Viewport size
    pub resolution: Size,
    /// Node top-left corner in viewport coordinates
    pub position: Point,
    /// Multiplied into the texture sample
    pub tint: Color,
}

impl Default for RenderOpProps {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            alpha: 1.0,
            resolution: Size::new(1920.0, 1080.0),
            position: Point::ZERO,
            tint: Color::WHITE,
        }
    }
}

/// Inputs of one `update`: node geometry plus the render operation
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateContext {
    pub size: Size,
    pub op: RenderOpProps,
}

impl UpdateContext {
    /// Build a context, clamping degenerate geometry instead of failing
    pub fn new(size: Size, op: &RenderOpProps) -> Self {
        let mut op = op.clone();

        let sanitize = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let clean = Size::new(sanitize(size.width), sanitize(size.height));
        if clean != size {
            warn!(
                "Clamped degenerate node size {}x{} to {}x{}",
                size.width, size.height, clean.width, clean.height
            );
        }

        if !(op.pixel_ratio.is_finite() && op.pixel_ratio > 0.0) {
            warn!("Invalid pixel ratio {}, using 1.0", op.pixel_ratio);
            op.pixel_ratio = 1.0;
        }
        op.alpha = if op.alpha.is_nan() {
            0.0
        } else {
            op.alpha.clamp(0.0, 1.0)
        };

        Self { size: clean, op }
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }
}

/// Uniforms every effect template declares ahead of its own
pub const BUILTIN_UNIFORMS: &[UniformDecl] = &[
    UniformDecl::new("resolution", UniformType::Vec2),
    UniformDecl::new("position", UniformType::Vec2),
    UniformDecl::new("dimensions", UniformType::Vec2),
    UniformDecl::new("pixel_ratio", UniformType::Float),
    UniformDecl::new("alpha", UniformType::Float),
    UniformDecl::new("tint", UniformType::Vec4),
];

/// Upload the built-in uniforms for one draw
pub fn write_builtins(ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
    sink.uniform_2f("resolution", ctx.op.resolution.to_array())?;
    sink.uniform_2f("position", ctx.op.position.to_array())?;
    sink.uniform_2f("dimensions", ctx.size.to_array())?;
    sink.uniform_1f("pixel_ratio", ctx.op.pixel_ratio)?;
    sink.uniform_1f("alpha", ctx.op.alpha)?;
    sink.uniform_4f("tint", ctx.op.tint.to_array())
}

/// A visual effect: typed props, their uniforms and the shading code
pub trait Effect: Default + Clone + fmt::Debug + PartialEq + DeserializeOwned {
    const KIND: EffectKind;

    /// Declared properties in declaration order
    const PROPERTIES: &'static [(&'static str, PropType)];

    /// Effect uniforms, laid out after [`BUILTIN_UNIFORMS`]
    const UNIFORMS: &'static [UniformDecl];

    /// WGSL fragment stage
    const FRAGMENT: &'static str;

    const VERTEX: &'static VertexStage = &VertexStage::QUAD;

    /// Read a property by its declared name
    fn get(&self, name: &str) -> Option<PropValue>;

    /// Write a property by its declared name
    fn set(&mut self, name: &str, value: PropValue) -> Result<()>;

    /// Cross-property checks that a single `set` cannot express
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Push this effect's uniforms for the current frame
    fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()>;

    /// Shade one fragment on the CPU from recorded uniforms
    fn shade(uniforms: &UniformSet, frag: &Fragment) -> Result<Color>;
}

/// Convert a declarative props object into typed props
///
/// Missing keys take their defaults; unknown keys and malformed values are
/// errors.
pub fn props_from_json<E: Effect>(value: &serde_json::Value) -> Result<E> {
    E::KIND.schema().check_keys(E::KIND, value)?;

    let props: E = if value.is_null() {
        E::default()
    } else {
        E::deserialize(value).map_err(|e| ShaderError::InvalidProps {
            shader: E::KIND.name().to_string(),
            message: e.to_string(),
        })?
    };

    props.validate()?;
    Ok(props)
}

macro_rules! effects {
    ($($kind:ident => $props:ty,)*) => {
        /// The closed set of built-in effects
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EffectKind {
            $($kind,)*
        }

        impl EffectKind {
            pub const ALL: &'static [EffectKind] = &[$(EffectKind::$kind,)*];

            /// Registration name
            pub fn name(&self) -> &'static str {
                match self {
                    $(EffectKind::$kind => stringify!($kind),)*
                }
            }

            pub fn properties(&self) -> &'static [(&'static str, PropType)] {
                match self {
                    $(EffectKind::$kind => <$props as Effect>::PROPERTIES,)*
                }
            }

            pub fn uniforms(&self) -> &'static [UniformDecl] {
                match self {
                    $(EffectKind::$kind => <$props as Effect>::UNIFORMS,)*
                }
            }

            pub fn fragment(&self) -> &'static str {
                match self {
                    $(EffectKind::$kind => <$props as Effect>::FRAGMENT,)*
                }
            }

            pub fn vertex_stage(&self) -> &'static VertexStage {
                match self {
                    $(EffectKind::$kind => <$props as Effect>::VERTEX,)*
                }
            }

            pub fn default_props(&self) -> EffectProps {
                match self {
                    $(EffectKind::$kind => EffectProps::$kind(<$props>::default()),)*
                }
            }

            pub fn props_from_json(&self, value: &serde_json::Value) -> Result<EffectProps> {
                match self {
                    $(EffectKind::$kind => props_from_json::<$props>(value).map(EffectProps::$kind),)*
                }
            }

            /// Shade one fragment on the CPU
            pub fn shade(&self, uniforms: &UniformSet, frag: &Fragment) -> Result<Color> {
                match self {
                    $(EffectKind::$kind => <$props as Effect>::shade(uniforms, frag),)*
                }
            }
        }

        /// Live props of one program
        #[derive(Clone, Debug, PartialEq)]
        pub enum EffectProps {
            $($kind($props),)*
        }

        impl EffectProps {
            pub fn kind(&self) -> EffectKind {
                match self {
                    $(EffectProps::$kind(_) => EffectKind::$kind,)*
                }
            }

            pub fn get(&self, name: &str) -> Option<PropValue> {
                match self {
                    $(EffectProps::$kind(p) => p.get(name),)*
                }
            }

            pub fn set(&mut self, name: &str, value: PropValue) -> Result<()> {
                match self {
                    $(EffectProps::$kind(p) => p.set(name, value),)*
                }
            }

            pub fn validate(&self) -> Result<()> {
                match self {
                    $(EffectProps::$kind(p) => p.validate(),)*
                }
            }

            pub fn update(&self, ctx: &UpdateContext, sink: &mut dyn UniformSink) -> Result<()> {
                match self {
                    $(EffectProps::$kind(p) => p.update(ctx, sink),)*
                }
            }
        }

        $(
            impl From<$props> for EffectProps {
                fn from(props: $props) -> Self {
                    EffectProps::$kind(props)
                }
            }
        )*
    };
}

effects! {
    Rounded => RoundedProps,
    RoundedWithBorder => RoundedWithBorderProps,
    RoundedWithShadow => RoundedWithShadowProps,
    RoundedWithBorderAndShadow => RoundedWithBorderAndShadowProps,
    Border => BorderProps,
    BorderTop => BorderTopProps,
    BorderRight => BorderRightProps,
    BorderBottom => BorderBottomProps,
    BorderLeft => BorderLeftProps,
    Shadow => ShadowProps,
    HolePunch => HolePunchProps,
    RadialGradient => RadialGradientProps,
    LinearGradient => LinearGradientProps,
}

impl EffectKind {
    /// Built-in uniforms followed by this effect's own
    pub fn uniform_layout(&self) -> UniformLayout {
        UniformLayout::new(BUILTIN_UNIFORMS.iter().chain(self.uniforms()))
    }

    /// Property schema with defaults taken from the props type's `Default`
    pub fn schema(&self) -> PropertySchema {
        let defaults = self.default_props();
        let decls = self
            .properties()
            .iter()
            .filter_map(|&(name, ty)| {
                let default = defaults.get(name);
                debug_assert!(default.is_some(), "{} declares '{}' without a getter", self.name(), name);
                default.map(|default| PropertyDecl { name, ty, default })
            })
            .collect();
        PropertySchema::new(decls)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self> {
        EffectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ShaderError::UnknownShader(s.to_string()))
    }
}

impl Default for EffectProps {
    fn default() -> Self {
        EffectProps::Rounded(RoundedProps::default())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>().unwrap(), *kind);
        }
        assert_eq!(EffectKind::ALL.len(), 13);
        assert!("Blur".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_every_property_has_a_default() {
        for kind in EffectKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema.len(), kind.properties().len(), "{}", kind);
            for decl in schema.iter() {
                assert_eq!(decl.default.ty(), decl.ty, "{}.{}", kind, decl.name);
            }
        }
    }

    #[test]
    fn test_effect_uniforms_do_not_shadow_builtins() {
        for kind in EffectKind::ALL {
            for decl in kind.uniforms() {
                assert!(
                    BUILTIN_UNIFORMS.iter().all(|b| b.name != decl.name),
                    "{} redeclares '{}'",
                    kind,
                    decl.name
                );
            }
        }
    }

    #[test]
    fn test_update_context_clamps_degenerate_input() {
        let op = RenderOpProps {
            pixel_ratio: 0.0,
            alpha: 3.0,
            ..Default::default()
        };
        let ctx = UpdateContext::new(Size::new(-10.0, f32::NAN), &op);
        assert_eq!(ctx.size, Size::ZERO);
        assert_eq!(ctx.op.pixel_ratio, 1.0);
        assert_eq!(ctx.op.alpha, 1.0);
    }

    #[test]
    fn test_props_kind_matches_variant() {
        for kind in EffectKind::ALL {
            assert_eq!(kind.default_props().kind(), *kind);
        }
    }
}
