//! Declarative effect descriptions
//!
//! Scene descriptions attach an effect to a node as
//!
//! ```json
//! { "shader": "RoundedWithBorder", "props": { "radius": 10, "border-width": [4, 8, 4, 8] } }
//! ```
//!
//! `props` may be omitted, in which case every property takes its default.
//! Four-component props accept a single number for all four components.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShaderError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDescription {
    /// Registered shader name
    pub shader: String,
    /// Props object, checked against the shader's schema when a program is
    /// created
    #[serde(default)]
    pub props: serde_json::Value,
}

impl EffectDescription {
    pub fn new(shader: impl Into<String>, props: serde_json::Value) -> Self {
        Self {
            shader: shader.into(),
            props,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ShaderError::InvalidProps {
            shader: "<description>".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_are_optional() {
        let desc = EffectDescription::from_json_str(r#"{ "shader": "Rounded" }"#).unwrap();
        assert_eq!(desc.shader, "Rounded");
        assert!(desc.props.is_null());
    }

    #[test]
    fn test_malformed_description() {
        assert!(matches!(
            EffectDescription::from_json_str(r#"{ "props": {} }"#),
            Err(ShaderError::InvalidProps { .. })
        ));
    }
}
