//! Loader for the render configuration format: one `key value...` entry per
//! line, covering the camera and the placement of the six body parts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::Vec3;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading model config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: `{key}` expects {expected} numeric value(s)")]
    MalformedValue {
        line: usize,
        key: String,
        expected: usize,
    },
}

const ORIGIN_KEYS: [(&str, &str); 6] = [
    ("headOrigin", "Head"),
    ("bodyOrigin", "Body"),
    ("leftArmOrigin", "LeftArm"),
    ("rightArmOrigin", "RightArm"),
    ("leftLegOrigin", "LeftLeg"),
    ("rightLegOrigin", "RightLeg"),
];

const ATTACHMENT_SCALE_KEYS: [(&str, &str); 6] = [
    ("headAttachmentScale", "Head"),
    ("bodyAttachmentScale", "Body"),
    ("leftArmAttachmentScale", "LeftArm"),
    ("rightArmAttachmentScale", "RightArm"),
    ("leftLegAttachmentScale", "LeftLeg"),
    ("rightLegAttachmentScale", "RightLeg"),
];

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub eye_position: Vec3,
    pub eye_target: Vec3,
    pub eye_up: Vec3,

    /// World-space origin per base body part group.
    pub origins: BTreeMap<String, Vec3>,

    /// Overlay scale-about-origin per base body part group.
    pub attachment_scales: BTreeMap<String, f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            eye_position: Vec3::new(0.0, 24.0, 48.0),
            eye_target: Vec3::new(0.0, 16.0, 0.0),
            eye_up: Vec3::Y,
            origins: BTreeMap::new(),
            attachment_scales: BTreeMap::new(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<RenderConfig, ConfigError> {
    let source = fs::read_to_string(path)?;
    parse_config(&source)
}

pub fn parse_config(source: &str) -> Result<RenderConfig, ConfigError> {
    let mut config = RenderConfig::default();

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let mut tokens = raw_line.split_whitespace();

        let Some(key) = tokens.next() else {
            continue;
        };

        let values: Vec<f32> = tokens.map_while(|token| token.parse().ok()).collect();
        let vec3 = |expected: usize| -> Result<Vec3, ConfigError> {
            if values.len() < 3 {
                return Err(ConfigError::MalformedValue {
                    line,
                    key: key.to_string(),
                    expected,
                });
            }
            Ok(Vec3::new(values[0], values[1], values[2]))
        };

        match key {
            "eyePosition" => config.eye_position = vec3(3)?,
            "eyeTarget" => config.eye_target = vec3(3)?,
            "eyeUpDirection" => config.eye_up = vec3(3)?,
            _ => {
                if let Some((_, part)) = ORIGIN_KEYS.iter().find(|(name, _)| *name == key) {
                    config.origins.insert(part.to_string(), vec3(3)?);
                } else if let Some((_, part)) =
                    ATTACHMENT_SCALE_KEYS.iter().find(|(name, _)| *name == key)
                {
                    let value = values.first().copied().ok_or(ConfigError::MalformedValue {
                        line,
                        key: key.to_string(),
                        expected: 1,
                    })?;
                    config.attachment_scales.insert(part.to_string(), value);
                } else {
                    warn!("line {line}: unknown config key `{key}`, skipping");
                }
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
eyePosition 0.0 24.0 48.0
eyeTarget 0.0 16.0 0.0
eyeUpDirection 0.0 1.0 0.0
headOrigin 0.0 24.0 0.0
leftArmOrigin 6.0 12.0 0.0
headAttachmentScale 1.125
someFutureKey 1 2 3
";

    #[test]
    fn camera_and_placement_keys_are_parsed() {
        let config = parse_config(CONFIG).unwrap();

        assert_eq!(config.eye_position, Vec3::new(0.0, 24.0, 48.0));
        assert_eq!(config.eye_target, Vec3::new(0.0, 16.0, 0.0));
        assert_eq!(config.eye_up, Vec3::Y);
        assert_eq!(config.origins["Head"], Vec3::new(0.0, 24.0, 0.0));
        assert_eq!(config.origins["LeftArm"], Vec3::new(6.0, 12.0, 0.0));
        assert_eq!(config.attachment_scales["Head"], 1.125);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let config = parse_config("someFutureKey 1 2 3\n").unwrap();
        assert!(config.origins.is_empty());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = parse_config("").unwrap();
        let defaults = RenderConfig::default();
        assert_eq!(config.eye_position, defaults.eye_position);
        assert_eq!(config.eye_target, defaults.eye_target);
    }

    #[test]
    fn malformed_values_carry_line_numbers() {
        let err = parse_config("eyePosition 1.0 oops 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedValue { line: 1, .. }));

        let err = parse_config("headAttachmentScale\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedValue { line: 1, .. }));
    }
}
