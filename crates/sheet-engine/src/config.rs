use std::path::Path;

use serde::{Deserialize, Serialize};
use sheet_ops::{BaseShapeDims, BaseShapeRequest};
use sheet_types::{OriginAnchor, ResolvePolicy, ShapeArchetype};

/// Engine settings. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting values for new base shapes.
    pub base_shape: BaseShapeDefaults,
    /// Policy given to edge references picked for new solid bends.
    pub solid_bend_policy: ResolvePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseShapeDefaults {
    pub archetype: ShapeArchetype,
    pub origin: OriginAnchor,
    pub fill_gaps: bool,
    pub radius: f64,
    pub thickness: f64,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub flange_width: f64,
}

impl Default for BaseShapeDefaults {
    fn default() -> Self {
        Self {
            archetype: ShapeArchetype::LShape,
            origin: OriginAnchor::centered(),
            fill_gaps: true,
            radius: 1.0,
            thickness: 1.0,
            width: 20.0,
            length: 30.0,
            height: 10.0,
            flange_width: 5.0,
        }
    }
}

impl BaseShapeDefaults {
    pub fn to_request(&self) -> BaseShapeRequest {
        BaseShapeRequest {
            archetype: self.archetype,
            dims: BaseShapeDims {
                thickness: self.thickness,
                radius: self.radius,
                width: self.width,
                length: self.length,
                height: self.height,
                flange_width: self.flange_width,
            },
            origin: self.origin,
            fill_gaps: self.fill_gaps,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Errors while reading engine configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(String),

    #[error("invalid config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        let request = config.base_shape.to_request();
        assert_eq!(request.archetype, ShapeArchetype::LShape);
        assert_eq!(request.origin, OriginAnchor::centered());
        assert!(request.fill_gaps);
        assert_eq!(request.dims.width, 20.0);
        assert_eq!(request.dims.flange_width, 5.0);
        assert_eq!(config.solid_bend_policy, ResolvePolicy::Strict);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "base_shape": { "archetype": "U-Shape", "origin": "+X,-Y", "height": 25.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.base_shape.archetype, ShapeArchetype::UShape);
        assert_eq!(config.base_shape.origin.to_string(), "+X,-Y");
        assert_eq!(config.base_shape.height, 25.0);
        assert_eq!(config.base_shape.length, 30.0);
        assert_eq!(config.solid_bend_policy, ResolvePolicy::Strict);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut config = EngineConfig::default();
        config.base_shape.archetype = ShapeArchetype::Hat;
        config.solid_bend_policy = ResolvePolicy::BestEffort;
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "base_shape": { "archetype": "Cone" } }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "base_shape": { "origin": "+Z,0" } }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::load("/nonexistent/sheet-engine.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
