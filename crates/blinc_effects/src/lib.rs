//! Blinc Effect Shaders
//!
//! Per-node visual effects computed analytically with signed distance fields
//! in a single fragment pass.
//!
//! # Features
//!
//! - **Rounded corners**: per-corner radii, clamped so adjacent corners never overlap
//! - **Borders**: uniform or per-edge widths, or a single edge
//! - **Shadows**: offset, blurred and spread drop shadows
//! - **Gradients**: linear and radial, up to 8 color stops
//! - **Hole punching**: transparent rounded-rectangle cutouts
//!
//! # Architecture
//!
//! - [`ShaderTemplate`]: immutable effect description (schema, WGSL, uniform layout)
//! - [`ShaderRegistry`]: name to template mapping, optionally installed process-wide
//! - [`ShaderProgram`]: a template bound to a node's live props
//! - [`UniformSink`]: where `update` pushes uniforms ([`UniformBlock`],
//!   [`UniformSet`] or the wgpu-backed [`EffectContext`], which gives every
//!   draw its own uniform slot)
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use blinc_core::Size;
//! use blinc_effects::{NodeGeometry, PropValue, RenderOpProps, ShaderRegistry};
//!
//! let registry = ShaderRegistry::with_builtin_effects().unwrap();
//! let node: Rc<dyn NodeGeometry> = Rc::new(Cell::new(Size::new(200.0, 100.0)));
//!
//! let mut program = registry.create_program("RoundedWithBorder", &node).unwrap();
//! program.set_prop("border-width", PropValue::Number(4.0)).unwrap();
//!
//! let uniforms = program.uniform_set(&RenderOpProps::default()).unwrap();
//! assert_eq!(uniforms.int("border_asym").unwrap(), 0);
//! ```

pub mod config;
pub mod effects;
pub mod error;
pub mod gpu;
pub mod math;
pub mod program;
pub mod props;
pub mod registry;
pub mod sdf;
pub mod shaders;
pub mod template;
pub mod uniforms;

pub use config::EffectDescription;
pub use effects::{
    write_builtins, Effect, EffectKind, EffectProps, RenderOpProps, UpdateContext,
    BUILTIN_UNIFORMS,
};
pub use error::{Result, ShaderError};
pub use gpu::{EffectContext, EffectDraw, EffectPipelineConfig, GpuEffectProgram, UniformRing};
pub use math::{all_equal, factor_radius};
pub use program::{NodeGeometry, ShaderProgram};
pub use props::{PropType, PropValue, PropertyDecl, PropertySchema};
pub use registry::{global_registry, install_global, ShaderRegistry};
pub use sdf::Fragment;
pub use shaders::VertexStage;
pub use template::ShaderTemplate;
pub use uniforms::{
    UniformBlock, UniformData, UniformDecl, UniformLayout, UniformSet, UniformSink, UniformType,
    UniformValue,
};
