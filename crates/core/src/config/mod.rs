//! Configuration
//!
//! Runtime settings plus a declarative TOML surface: a config file can carry
//! field and form definitions that land in the catalog, so a deployment can
//! add fields without writing registration code.
//!
//! # Example
//!
//! ```toml
//! debug_args = false
//! option_prefix = "formforge_"
//!
//! [[fields]]
//! name = "website"
//! object_type = "post:solution"
//! type = "url"
//! label = "Website"
//! size = 50
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::args::ArgMap;
use crate::object_type::ObjectType;

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

const DEFAULT_OPTION_PREFIX: &str = "formforge_";

static DEBUG_ARGS: AtomicBool = AtomicBool::new(false);
static OPTION_PREFIX: LazyLock<RwLock<String>> =
    LazyLock::new(|| RwLock::new(DEFAULT_OPTION_PREFIX.to_string()));

/// Whether constructed objects retain their final argument map.
pub fn debug_args_enabled() -> bool {
    DEBUG_ARGS.load(Ordering::Relaxed)
}

pub fn set_debug_args(enabled: bool) {
    DEBUG_ARGS.store(enabled, Ordering::Relaxed);
}

/// Prefix for option storage keys.
pub fn option_prefix() -> String {
    OPTION_PREFIX.read().clone()
}

pub fn set_option_prefix(prefix: &str) {
    *OPTION_PREFIX.write() = prefix.to_string();
}

/// A field definition in config form. Everything beyond the name and object
/// type passes straight through as construction arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub object_type: String,
    #[serde(flatten)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// A form definition in config form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub name: String,
    pub object_type: String,
    #[serde(flatten)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Retain final argument maps on constructed objects.
    pub debug_args: bool,
    /// Prefix for option storage keys.
    pub option_prefix: String,
    pub fields: Vec<FieldConfig>,
    pub forms: Vec<FormConfig>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            debug_args: false,
            option_prefix: DEFAULT_OPTION_PREFIX.to_string(),
            fields: Vec::new(),
            forms: Vec::new(),
        }
    }
}

impl CoreConfig {
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file, creating a default one if missing.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&content)?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Apply runtime settings and register the declared fields and forms.
    pub fn apply(&self) {
        set_debug_args(self.debug_args);
        set_option_prefix(&self.option_prefix);

        for field in &self.fields {
            let args: ArgMap = field
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            crate::catalog::register_field(&field.name, ObjectType::parse(&field.object_type), args);
        }
        for form in &self.forms {
            let args: ArgMap = form
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            crate::catalog::register_form(&form.name, ObjectType::parse(&form.object_type), args);
        }
    }
}

/// Load a standalone fields file and register its definitions.
///
/// Same TOML shape as [`CoreConfig`] minus the runtime settings; a missing
/// file is an error here, not a default.
pub fn load_fields_file(path: &Path) -> ConfigResult<()> {
    #[derive(Deserialize)]
    struct FieldsFile {
        #[serde(default)]
        fields: Vec<FieldConfig>,
        #[serde(default)]
        forms: Vec<FormConfig>,
    }

    let content = std::fs::read_to_string(path)?;
    let file: FieldsFile = toml::from_str(&content)?;
    for field in &file.fields {
        let args: ArgMap = field.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        crate::catalog::register_field(&field.name, ObjectType::parse(&field.object_type), args);
    }
    for form in &file.forms {
        let args: ArgMap = form.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        crate::catalog::register_form(&form.name, ObjectType::parse(&form.object_type), args);
    }
    tracing::debug!(
        "Registered {} fields and {} forms from {:?}",
        file.fields.len(),
        file.forms.len(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert!(!config.debug_args);
        assert_eq!(config.option_prefix, "formforge_");
        assert!(config.fields.is_empty());
    }

    #[test]
    fn test_parse_field_definitions() {
        let config = CoreConfig::from_toml(
            r#"
            option_prefix = "acme_"

            [[fields]]
            name = "website"
            object_type = "post:solution"
            type = "url"
            label = "Website"
            size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.option_prefix, "acme_");
        assert_eq!(config.fields.len(), 1);
        let field = &config.fields[0];
        assert_eq!(field.name, "website");
        assert_eq!(field.args.get("type"), Some(&serde_json::json!("url")));
        assert_eq!(field.args.get("size"), Some(&serde_json::json!(50)));
    }

    #[test]
    fn test_round_trip() {
        let config = CoreConfig {
            debug_args: true,
            ..Default::default()
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let reparsed = CoreConfig::from_toml(&serialized).unwrap();
        assert!(reparsed.debug_args);
    }
}
