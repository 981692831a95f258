//! Shader type registry
//!
//! Maps registration names to templates. The host fills a registry once at
//! startup and may install it process-wide with [`install_global`]; after
//! that it is read-only.

use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::EffectDescription;
use crate::effects::EffectKind;
use crate::error::{Result, ShaderError};
use crate::program::{NodeGeometry, ShaderProgram};
use crate::template::ShaderTemplate;

static GLOBAL_REGISTRY: OnceLock<ShaderRegistry> = OnceLock::new();

#[derive(Debug, Default)]
pub struct ShaderRegistry {
    templates: FxHashMap<String, Arc<ShaderTemplate>>,
    /// Registration order
    order: Vec<String>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in effect under its own name
    pub fn with_builtin_effects() -> Result<Self> {
        let mut registry = Self::new();
        for kind in EffectKind::ALL {
            registry.register_effect(*kind)?;
        }
        Ok(registry)
    }

    /// Register a template under `name`
    ///
    /// Registering a name twice is a configuration error; the first template
    /// stays registered.
    pub fn register(&mut self, name: impl Into<String>, template: Arc<ShaderTemplate>) -> Result<()> {
        let name = name.into();
        if self.templates.contains_key(&name) {
            return Err(ShaderError::DuplicateShader(name));
        }

        debug!("Registered shader type '{}' ({})", name, template.kind());
        self.order.push(name.clone());
        self.templates.insert(name, template);
        Ok(())
    }

    /// Register a built-in effect under its own name
    pub fn register_effect(&mut self, kind: EffectKind) -> Result<()> {
        self.register(kind.name(), Arc::new(ShaderTemplate::new(kind)?))
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ShaderTemplate>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::UnknownShader(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Registered templates in registration order
    pub fn templates(&self) -> impl Iterator<Item = &Arc<ShaderTemplate>> {
        self.order.iter().filter_map(|name| self.templates.get(name))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Bind the named shader to a node with default props
    pub fn create_program(&self, name: &str, node: &Rc<dyn NodeGeometry>) -> Result<ShaderProgram> {
        Ok(self.resolve(name)?.instantiate(node))
    }

    /// Bind a declaratively described shader to a node
    pub fn create_program_from_description(
        &self,
        description: &EffectDescription,
        node: &Rc<dyn NodeGeometry>,
    ) -> Result<ShaderProgram> {
        let template = self.resolve(&description.shader)?;
        let props = template.props_from_json(&description.props)?;
        ShaderProgram::with_props(template, node, props)
    }
}

/// Install the process-wide registry
///
/// Fails with [`ShaderError::RegistryAlreadyInstalled`] on every call after
/// the first.
pub fn install_global(registry: ShaderRegistry) -> Result<&'static ShaderRegistry> {
    let count = registry.len();
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| ShaderError::RegistryAlreadyInstalled)?;
    debug!("Installed global shader registry with {} shader types", count);
    global_registry().ok_or(ShaderError::RegistryAlreadyInstalled)
}

/// The process-wide registry, if installed
pub fn global_registry() -> Option<&'static ShaderRegistry> {
    GLOBAL_REGISTRY.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinc_core::Size;

    #[test]
    fn test_builtin_names() {
        let registry = ShaderRegistry::with_builtin_effects().unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            [
                "Rounded",
                "RoundedWithBorder",
                "RoundedWithShadow",
                "RoundedWithBorderAndShadow",
                "Border",
                "BorderTop",
                "BorderRight",
                "BorderBottom",
                "BorderLeft",
                "Shadow",
                "HolePunch",
                "RadialGradient",
                "LinearGradient",
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut registry = ShaderRegistry::new();
        registry.register_effect(EffectKind::Rounded).unwrap();
        let template = Arc::new(ShaderTemplate::new(EffectKind::Border).unwrap());

        assert_eq!(
            registry.register("Rounded", template),
            Err(ShaderError::DuplicateShader("Rounded".to_string()))
        );
        assert_eq!(registry.resolve("Rounded").unwrap().kind(), EffectKind::Rounded);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_shader() {
        let registry = ShaderRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("Blur").unwrap_err(),
            ShaderError::UnknownShader("Blur".to_string())
        );
    }

    #[test]
    fn test_alias_registration() {
        let mut registry = ShaderRegistry::new();
        let card = Arc::new(ShaderTemplate::named("Card", EffectKind::RoundedWithShadow).unwrap());
        registry.register("Card", card).unwrap();

        let node: Rc<dyn NodeGeometry> = Rc::new(Size::new(10.0, 10.0));
        let program = registry.create_program("Card", &node).unwrap();
        assert_eq!(program.name(), "Card");
        assert!(registry.create_program("Rounded", &node).is_err());
    }
}
