//! Runtime settings for classification and message resolution.
//!
//! Settings come from an optional TOML file and `FAULTLINE_`-prefixed
//! environment variables, e.g. `FAULTLINE_MAX_CAUSE_DEPTH=20`.
//!
//! ```toml
//! max_cause_depth = 50
//!
//! [messages]
//! rate_limited = "Slow down a little."
//!
//! [[permissions]]
//! id = "android.permission.CAMERA"
//! label = "Camera"
//! ```

use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::classify::Classifier;
use crate::failure::DEFAULT_MAX_CAUSE_DEPTH;
use crate::messages::{LocalContext, MessageKey};

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file was not found.
    #[error("settings file not found: {0}")]
    FileNotFound(String),

    /// The path is not valid UTF-8.
    #[error("invalid settings path: {0}")]
    InvalidPath(String),

    /// Layered configuration could not be built or deserialized.
    #[error("failed to load settings: {0}")]
    Config(#[from] ConfigError),

    /// TOML text could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A message override names a template that does not exist.
    #[error("unknown message key: {0}")]
    UnknownMessage(String),

    /// The cause walk must inspect at least the failure itself.
    #[error("max_cause_depth must be at least 1")]
    InvalidDepth,
}

/// Label shown for a platform permission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionLabel {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Maximum number of cause-chain nodes inspected per rule.
    #[serde(default = "default_max_cause_depth")]
    pub max_cause_depth: usize,
    /// Template overrides keyed by message id.
    #[serde(default)]
    pub messages: HashMap<String, String>,
    /// Known permission labels.
    #[serde(default)]
    pub permissions: Vec<PermissionLabel>,
}

fn default_max_cause_depth() -> usize {
    DEFAULT_MAX_CAUSE_DEPTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_cause_depth: DEFAULT_MAX_CAUSE_DEPTH,
            messages: HashMap::new(),
            permissions: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings from an optional file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed, or if the
    /// resulting settings are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            let path_str = path
                .to_str()
                .ok_or_else(|| SettingsError::InvalidPath(format!("{:?}", path)))?;
            if !path.exists() {
                return Err(SettingsError::FileNotFound(path_str.to_string()));
            }
            builder = builder.add_source(File::with_name(path_str));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("FAULTLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from TOML text, without environment overrides.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.max_cause_depth == 0 {
            return Err(SettingsError::InvalidDepth);
        }
        if let Some(unknown) = self
            .messages
            .keys()
            .find(|id| MessageKey::from_id(id).is_none())
        {
            return Err(SettingsError::UnknownMessage(unknown.clone()));
        }
        Ok(())
    }

    /// Message context with the configured overrides and permission labels.
    pub fn context(&self) -> LocalContext {
        let context = self
            .messages
            .iter()
            .filter_map(|(id, template)| MessageKey::from_id(id).map(|key| (key, template)))
            .fold(LocalContext::new(), |context, (key, template)| {
                context.with_template(key, template.clone())
            });

        self.permissions.iter().fold(context, |context, permission| {
            context.with_permission_label(permission.id.clone(), permission.label.clone())
        })
    }

    /// Standard classifier honoring the configured cause depth.
    pub fn classifier(&self) -> Classifier {
        Classifier::standard().with_max_cause_depth(self.max_cause_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageContext;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_cause_depth, DEFAULT_MAX_CAUSE_DEPTH);
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::parse(
            r#"
            max_cause_depth = 12

            [messages]
            rate_limited = "Bitte warten."

            [[permissions]]
            id = "android.permission.CAMERA"
            label = "Kamera"
        "#,
        )
        .unwrap();

        assert_eq!(settings.max_cause_depth, 12);
        assert_eq!(settings.classifier().walker().max_depth(), 12);

        let context = settings.context();
        assert_eq!(context.text(MessageKey::RateLimited, &[]), "Bitte warten.");
        assert_eq!(
            context.permission_label("android.permission.CAMERA"),
            Ok("Kamera".to_string())
        );
    }

    #[test]
    fn test_rejects_unknown_message_key() {
        let err = Settings::parse("[messages]\nno_such_key = \"x\"").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownMessage(key) if key == "no_such_key"));
    }

    #[test]
    fn test_rejects_zero_depth() {
        let err = Settings::parse("max_cause_depth = 0").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidDepth));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("faultline.toml");
        std::fs::write(
            &path,
            "max_cause_depth = 7\n\n[messages]\nnot_found = \"Gone.\"\n",
        )
        .expect("Failed to write settings");

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.max_cause_depth, 7);
        assert_eq!(settings.context().text(MessageKey::NotFound, &[]), "Gone.");
    }
}
