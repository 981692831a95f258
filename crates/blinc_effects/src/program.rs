//! Shader programs bound to scene nodes

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use blinc_core::{Color, Size, Vec2};
use tracing::trace;

use crate::effects::{write_builtins, EffectProps, RenderOpProps, UpdateContext};
use crate::error::{Result, ShaderError};
use crate::props::PropValue;
use crate::sdf::Fragment;
use crate::template::ShaderTemplate;
use crate::uniforms::{UniformSet, UniformSink};

/// Geometry a program reads from its node on every update
pub trait NodeGeometry {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl NodeGeometry for Size {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }
}

/// A node whose size changes through shared references
impl NodeGeometry for Cell<Size> {
    fn width(&self) -> f32 {
        self.get().width
    }

    fn height(&self) -> f32 {
        self.get().height
    }
}

/// A template bound to one node's live props
///
/// The program only observes its node; once the node is dropped every update
/// fails with [`ShaderError::NodeReleased`].
#[derive(Debug)]
pub struct ShaderProgram {
    template: Arc<ShaderTemplate>,
    props: EffectProps,
    node: Weak<dyn NodeGeometry>,
}

impl ShaderProgram {
    pub fn new(template: Arc<ShaderTemplate>, node: &Rc<dyn NodeGeometry>) -> Self {
        let props = template.kind().default_props();
        Self {
            template,
            props,
            node: Rc::downgrade(node),
        }
    }

    /// Bind with explicit props; they must belong to the template's effect
    pub fn with_props(
        template: Arc<ShaderTemplate>,
        node: &Rc<dyn NodeGeometry>,
        props: EffectProps,
    ) -> Result<Self> {
        if props.kind() != template.kind() {
            return Err(ShaderError::InvalidProps {
                shader: template.name().to_string(),
                message: format!("expected {} props, got {} props", template.kind(), props.kind()),
            });
        }
        props.validate()?;

        Ok(Self {
            template,
            props,
            node: Rc::downgrade(node),
        })
    }

    pub fn template(&self) -> &Arc<ShaderTemplate> {
        &self.template
    }

    pub fn name(&self) -> &str {
        self.template.name()
    }

    pub fn props(&self) -> &EffectProps {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<PropValue> {
        self.props.get(name)
    }

    /// Change one property; on error the props are left unchanged
    pub fn set_prop(&mut self, name: &str, value: PropValue) -> Result<()> {
        let mut props = self.props.clone();
        props.set(name, value)?;
        props.validate()?;
        self.props = props;
        Ok(())
    }

    /// Replace all props from a declarative description
    pub fn set_props_json(&mut self, value: &serde_json::Value) -> Result<()> {
        self.props = self.template.props_from_json(value)?;
        Ok(())
    }

    /// Current size of the bound node
    pub fn node_size(&self) -> Result<Size> {
        self.node
            .upgrade()
            .map(|node| node.size())
            .ok_or_else(|| ShaderError::NodeReleased(self.name().to_string()))
    }

    /// Push built-in and effect uniforms for the current frame
    pub fn update(&self, op: &RenderOpProps, sink: &mut dyn UniformSink) -> Result<()> {
        let ctx = UpdateContext::new(self.node_size()?, op);
        trace!(
            "Updating '{}' for {}x{} node",
            self.name(),
            ctx.width(),
            ctx.height()
        );

        write_builtins(&ctx, sink)?;
        self.props.update(&ctx, sink)
    }

    /// Uniforms of the next draw, recorded instead of uploaded
    pub fn uniform_set(&self, op: &RenderOpProps) -> Result<UniformSet> {
        let mut set = UniformSet::new(self.template.layout().clone());
        self.update(op, &mut set)?;
        Ok(set)
    }

    /// Shade one node-space pixel on the CPU
    pub fn shade(&self, op: &RenderOpProps, node_coords: Vec2, texel: Color) -> Result<Color> {
        let uniforms = self.uniform_set(op)?;
        self.template
            .kind()
            .shade(&uniforms, &Fragment::new(node_coords, texel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    fn template(kind: EffectKind) -> Arc<ShaderTemplate> {
        Arc::new(ShaderTemplate::new(kind).unwrap())
    }

    #[test]
    fn test_update_reads_current_node_size() {
        let node = Rc::new(Cell::new(Size::new(100.0, 100.0)));
        let geometry: Rc<dyn NodeGeometry> = node.clone();
        let mut program = template(EffectKind::Rounded).instantiate(&geometry);
        program.set_prop("radius", PropValue::Number(80.0)).unwrap();

        let set = program.uniform_set(&RenderOpProps::default()).unwrap();
        assert_eq!(set.vec4("radius").unwrap(), [50.0; 4]);

        node.set(Size::new(400.0, 400.0));
        let set = program.uniform_set(&RenderOpProps::default()).unwrap();
        assert_eq!(set.vec4("radius").unwrap(), [80.0; 4]);
        assert_eq!(set.vec2("dimensions").unwrap(), [400.0, 400.0]);
    }

    #[test]
    fn test_released_node_is_an_error() {
        let geometry: Rc<dyn NodeGeometry> = Rc::new(Size::new(10.0, 10.0));
        let program = template(EffectKind::Shadow).instantiate(&geometry);
        drop(geometry);

        assert_eq!(
            program.uniform_set(&RenderOpProps::default()).unwrap_err(),
            ShaderError::NodeReleased("Shadow".to_string())
        );
    }

    #[test]
    fn test_failed_set_keeps_props() {
        let geometry: Rc<dyn NodeGeometry> = Rc::new(Size::new(10.0, 10.0));
        let mut program = template(EffectKind::HolePunch).instantiate(&geometry);
        let before = program.props().clone();

        assert!(program.set_prop("width", PropValue::Number(-4.0)).is_err());
        assert!(program.set_prop("radius", PropValue::Color(0xff)).is_err());
        assert_eq!(program.props(), &before);
    }

    #[test]
    fn test_with_props_checks_kind() {
        let geometry: Rc<dyn NodeGeometry> = Rc::new(Size::new(10.0, 10.0));
        let props = EffectKind::Border.default_props();
        assert!(ShaderProgram::with_props(template(EffectKind::Rounded), &geometry, props).is_err());
    }

    #[test]
    fn test_render_op_reaches_builtins() {
        let geometry: Rc<dyn NodeGeometry> = Rc::new(Size::new(10.0, 20.0));
        let program = template(EffectKind::Border).instantiate(&geometry);
        let op = RenderOpProps {
            pixel_ratio: 2.0,
            alpha: 0.5,
            position: Vec2::new(30.0, 40.0),
            ..Default::default()
        };

        let set = program.uniform_set(&op).unwrap();
        assert_eq!(set.float("pixel_ratio").unwrap(), 2.0);
        assert_eq!(set.float("alpha").unwrap(), 0.5);
        assert_eq!(set.vec2("position").unwrap(), [30.0, 40.0]);
        assert_eq!(set.vec2("resolution").unwrap(), [1920.0, 1080.0]);
    }
}
