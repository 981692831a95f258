//! Shader templates
//!
//! A [`ShaderTemplate`] is the immutable description of one effect as the
//! renderer sees it: registration name, property schema, vertex stage,
//! fragment source and uniform layout. Templates are shared through `Arc` and
//! act as factories for [`ShaderProgram`]s.

use std::rc::Rc;
use std::sync::Arc;

use blinc_core::Size;
use tracing::debug;

use crate::effects::{write_builtins, EffectKind, EffectProps, RenderOpProps, UpdateContext};
use crate::error::{Result, ShaderError};
use crate::program::{NodeGeometry, ShaderProgram};
use crate::props::PropertySchema;
use crate::shaders::{compose_module, VertexStage};
use crate::uniforms::{UniformLayout, UniformSet};

#[derive(Debug)]
pub struct ShaderTemplate {
    name: String,
    kind: EffectKind,
    schema: PropertySchema,
    vertex: &'static VertexStage,
    fragment: &'static str,
    layout: Arc<UniformLayout>,
    defaults: UniformSet,
}

impl ShaderTemplate {
    /// Template for a built-in effect under its own name
    pub fn new(kind: EffectKind) -> Result<Self> {
        Self::with_vertex(kind.name(), kind, kind.vertex_stage())
    }

    /// Template for a built-in effect under another name
    pub fn named(name: impl Into<String>, kind: EffectKind) -> Result<Self> {
        Self::with_vertex(name, kind, kind.vertex_stage())
    }

    /// Template with an explicit vertex stage
    ///
    /// Fails with [`ShaderError::MissingUniform`] when the stage reads a
    /// uniform the effect does not declare.
    pub fn with_vertex(
        name: impl Into<String>,
        kind: EffectKind,
        vertex: &'static VertexStage,
    ) -> Result<Self> {
        let name = name.into();
        let layout = Arc::new(kind.uniform_layout());

        if let Some(missing) = vertex.requires.iter().find(|u| !layout.contains(u)) {
            return Err(ShaderError::MissingUniform {
                shader: name,
                stage: vertex.name.to_string(),
                uniform: missing.to_string(),
            });
        }

        // Defaults as uploaded for a node that has no size yet
        let mut defaults = UniformSet::new(layout.clone());
        let ctx = UpdateContext::new(Size::ZERO, &RenderOpProps::default());
        write_builtins(&ctx, &mut defaults)?;
        kind.default_props().update(&ctx, &mut defaults)?;

        debug!(
            "Created shader template '{}' ({}, {} uniforms, {} bytes)",
            name,
            kind,
            layout.len(),
            layout.size()
        );

        Ok(Self {
            name,
            kind,
            schema: kind.schema(),
            vertex,
            fragment: kind.fragment(),
            layout,
            defaults,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn schema(&self) -> &PropertySchema {
        &self.schema
    }

    pub fn vertex(&self) -> &'static VertexStage {
        self.vertex
    }

    pub fn fragment(&self) -> &'static str {
        self.fragment
    }

    pub fn layout(&self) -> &Arc<UniformLayout> {
        &self.layout
    }

    /// Uniform values before the first update
    pub fn defaults(&self) -> &UniformSet {
        &self.defaults
    }

    /// Complete WGSL module: uniforms, bindings, vertex and fragment stages
    pub fn source(&self) -> String {
        compose_module(&self.layout, self.vertex, self.fragment)
    }

    /// Parse and validate the generated WGSL
    pub fn validate(&self) -> Result<naga::Module> {
        let source = self.source();
        let compile_error = |message: String| ShaderError::Compile {
            shader: self.name.clone(),
            message,
        };

        let module = naga::front::wgsl::parse_str(&source)
            .map_err(|e| compile_error(e.emit_to_string(&source)))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        validator
            .validate(&module)
            .map_err(|e| compile_error(e.emit_to_string(&source)))?;

        debug!("Validated shader '{}'", self.name);
        Ok(module)
    }

    /// Convert a declarative props object for this template
    pub fn props_from_json(&self, value: &serde_json::Value) -> Result<EffectProps> {
        self.kind.props_from_json(value)
    }

    /// Bind this template to a node with default props
    pub fn instantiate(self: &Arc<Self>, node: &Rc<dyn NodeGeometry>) -> ShaderProgram {
        ShaderProgram::new(self.clone(), node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformValue;

    #[test]
    fn test_effect_uniforms_follow_builtins() {
        let template = ShaderTemplate::new(EffectKind::RoundedWithBorder).unwrap();
        let layout = template.layout();
        assert_eq!(layout.slot("tint").unwrap().offset, 32);
        assert_eq!(layout.slot("radius").unwrap().offset, 48);
        assert_eq!(layout.slot("border_asym").unwrap().offset, 96);
    }

    #[test]
    fn test_shadow_stage_requires_shadow_uniform() {
        let err = ShaderTemplate::with_vertex("Rounded", EffectKind::Rounded, &VertexStage::SHADOW)
            .unwrap_err();
        assert_eq!(
            err,
            ShaderError::MissingUniform {
                shader: "Rounded".to_string(),
                stage: "shadow".to_string(),
                uniform: "shadow".to_string(),
            }
        );
        assert!(ShaderTemplate::new(EffectKind::Shadow).is_ok());
    }

    #[test]
    fn test_defaults_cover_every_uniform() {
        for kind in EffectKind::ALL {
            let template = ShaderTemplate::new(*kind).unwrap();
            assert_eq!(
                template.defaults().len(),
                template.layout().len(),
                "{}",
                kind
            );
        }
    }

    #[test]
    fn test_default_radius_is_zero_without_geometry() {
        let template = ShaderTemplate::new(EffectKind::Rounded).unwrap();
        assert_eq!(
            template.defaults().get("radius"),
            Some(&UniformValue::Vec4([0.0; 4]))
        );
    }

    #[test]
    fn test_named_template() {
        let template = ShaderTemplate::named("Card", EffectKind::RoundedWithShadow).unwrap();
        assert_eq!(template.name(), "Card");
        assert_eq!(template.kind(), EffectKind::RoundedWithShadow);
        assert_eq!(template.vertex(), &VertexStage::SHADOW);
    }

    #[test]
    fn test_source_declares_uniform_struct() {
        let template = ShaderTemplate::new(EffectKind::LinearGradient).unwrap();
        let source = template.source();
        assert!(source.contains("struct Uniforms {"));
        assert!(source.contains("    colors: array<vec4<f32>, 8>,\n"));
        assert!(source.contains("fn gradient_color("));
        assert!(source.contains("fn fs_main("));
    }
}
