//! Error types for blinc_effects

use thiserror::Error;

use crate::props::PropType;
use crate::uniforms::UniformType;

/// Errors raised while registering, configuring or binding effect shaders
///
/// Configuration and binding errors indicate a defect in the host program;
/// they are reported to the caller and never replaced by fallback values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// A shader type was registered twice under the same name
    #[error("shader type '{0}' is already registered")]
    DuplicateShader(String),

    /// No shader type is registered under the requested name
    #[error("no such shader: '{0}'")]
    UnknownShader(String),

    /// A property name that the shader's schema does not declare
    #[error("shader '{shader}' has no property '{property}'")]
    UnknownProperty { shader: String, property: String },

    /// A property value of the wrong shape
    #[error("property '{property}' of shader '{shader}' expects {expected}, got {actual}")]
    InvalidProperty {
        shader: String,
        property: String,
        expected: PropType,
        actual: PropType,
    },

    /// A declarative props description that could not be converted
    #[error("invalid props for shader '{shader}': {message}")]
    InvalidProps { shader: String, message: String },

    /// A vertex stage reads a uniform the template does not declare
    #[error("vertex stage '{stage}' requires uniform '{uniform}' which shader '{shader}' does not declare")]
    MissingUniform {
        shader: String,
        stage: String,
        uniform: String,
    },

    /// The process-wide registry was installed more than once
    #[error("the global shader registry is already installed")]
    RegistryAlreadyInstalled,

    /// A uniform upload without a bound program
    #[error("no shader program is bound")]
    NoProgramBound,

    /// A uniform name the bound program does not declare
    #[error("uniform '{0}' is not declared by the bound program")]
    UnknownUniform(String),

    /// A uniform upload whose shape differs from the declaration
    #[error("uniform '{name}' is declared as {declared}, cannot upload {uploaded}")]
    UniformTypeMismatch {
        name: String,
        declared: UniformType,
        uploaded: UniformType,
    },

    /// An array upload longer than the declared array
    #[error("uniform '{name}' holds {capacity} elements, got {len}")]
    UniformArrayOverflow {
        name: String,
        capacity: usize,
        len: usize,
    },

    /// More draws of one shader in a frame than its uniform ring holds
    #[error("shader '{shader}' has no uniform slot left this frame ({capacity} per frame)")]
    UniformRingFull { shader: String, capacity: u32 },

    /// The node a program was bound to no longer exists
    #[error("the node bound to this '{0}' program has been released")]
    NodeReleased(String),

    /// Shader source rejected by the shader compiler
    #[error("shader '{shader}' failed to compile: {message}")]
    Compile { shader: String, message: String },
}

/// Result type for blinc_effects operations
pub type Result<T> = std::result::Result<T, ShaderError>;
