//! TOML settings file
//!
//! Settings describe the host environment the listeners run in: the default
//! container factory, string properties for `${...}` placeholders, named
//! queue objects for `#{@name}` references, marker definitions and logging.
//!
//! ```toml
//! [listener]
//! default_container_factory = "rabbitListenerContainerFactory"
//! auto_startup = true
//!
//! [logging]
//! level = "debug"
//! format = "ext"
//!
//! [properties]
//! "orders.queue" = "orders"
//!
//! [queues.myTestQueue]
//! name = "testQueue"
//!
//! [markers.FooListener]
//! queues = ["metaTestQueue"]
//! ```

use crate::context::graph::Queue;
use crate::listener::declaration::{ListenerDeclaration, DEFAULT_CONTAINER_FACTORY};
use crate::listener::meta::MarkerDefinition;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory below the user's config dir holding the settings file
pub const CONFIG_DIR_NAME: &str = "RabbitListeners";

/// File name of the default settings file
pub const CONFIG_FILE_NAME: &str = "listeners.toml";

/// Errors while loading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Cannot read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration{}: {message}", location(path))]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Invalid configuration value '{key}': {message}")]
    Invalid { key: String, message: String },
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Parse { message, .. } | ConfigError::Invalid { message, .. } => {
                Some(message)
            }
            ConfigError::NotFound { .. } => Some("Configuration file does not exist"),
            ConfigError::Io { .. } => Some("Configuration file cannot be read"),
        }
    }
}

/// `[listener]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerSettings {
    pub default_container_factory: String,
    pub auto_startup: bool,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            default_container_factory: DEFAULT_CONTAINER_FACTORY.to_string(),
            auto_startup: true,
        }
    }
}

/// `[logging]` section; command line flags take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
    pub color: Option<bool>,
}

/// One `[markers.<id>]` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerSettings {
    /// Queue references of the embedded declaration; empty = no declaration
    pub queues: Vec<String>,
    pub container_factory: Option<String>,
    pub exclusive: Option<bool>,
    pub priority: Option<i32>,
    /// Markers applied to this marker
    pub markers: Vec<String>,
}

impl MarkerSettings {
    pub fn to_definition(&self) -> MarkerDefinition {
        let mut definition = MarkerDefinition::new();
        if !self.queues.is_empty() {
            let mut declaration = ListenerDeclaration::new(self.queues.iter().cloned());
            if let Some(factory) = &self.container_factory {
                declaration = declaration.with_container_factory(factory.clone());
            }
            if let Some(exclusive) = self.exclusive {
                declaration = declaration.with_exclusive(exclusive);
            }
            if let Some(priority) = self.priority {
                declaration = declaration.with_priority(priority);
            }
            definition = definition.with_declaration(declaration);
        }
        self.markers
            .iter()
            .fold(definition, |definition, marker| definition.with_marker(marker.clone()))
    }
}

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub listener: ListenerSettings,
    pub logging: LoggingSettings,
    pub properties: BTreeMap<String, String>,
    pub queues: BTreeMap<String, Queue>,
    pub markers: BTreeMap<String, MarkerSettings>,
}

impl Settings {
    /// Default settings file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, None)
    }

    /// Load settings from a file that must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&contents, Some(path))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load the given file, or the default file when present, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => {
                    log::debug!("No settings file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn parse(contents: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.map(Path::to_path_buf),
            message: e.message().to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.default_container_factory.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "listener.default_container_factory".to_string(),
                message: "factory name must not be empty".to_string(),
            });
        }
        for (key, queue) in &self.queues {
            if queue.name().trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: format!("queues.{}.name", key),
                    message: "queue name must not be empty".to_string(),
                });
            }
        }
        for (key, marker) in &self.markers {
            if marker.queues.is_empty() && marker.markers.is_empty() {
                return Err(ConfigError::Invalid {
                    key: format!("markers.{}", key),
                    message: "marker must declare queues or apply other markers".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[listener]
default_container_factory = "testFactory"
auto_startup = false

[logging]
level = "debug"
format = "json"

[properties]
"orders.queue" = "orders"

[queues.myTestQueue]
name = "testQueue"

[queues.mySecondQueue]
name = "secondQueue"
durable = false

[markers.FooListener]
queues = ["metaTestQueue"]

[markers.BarListener]
markers = ["FooListener"]
"#;

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml_str(SAMPLE).unwrap();

        assert_eq!(settings.listener.default_container_factory, "testFactory");
        assert!(!settings.listener.auto_startup);
        assert_eq!(settings.logging.level.as_deref(), Some("debug"));
        assert_eq!(settings.logging.format.as_deref(), Some("json"));
        assert_eq!(settings.properties["orders.queue"], "orders");
        assert_eq!(settings.queues["myTestQueue"], Queue::new("testQueue"));
        assert!(!settings.queues["mySecondQueue"].is_durable());

        let foo = settings.markers["FooListener"].to_definition();
        assert_eq!(foo.declarations().len(), 1);
        assert_eq!(foo.declarations()[0].queues(), ["metaTestQueue".to_string()]);
        let bar = settings.markers["BarListener"].to_definition();
        assert!(bar.declarations().is_empty());
        assert_eq!(bar.markers(), ["FooListener".to_string()]);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.listener.default_container_factory,
            DEFAULT_CONTAINER_FACTORY
        );
        assert!(settings.listener.auto_startup);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = Settings::from_toml_str("[listener]\nfactory = \"x\"");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = Settings::from_toml_str("[queues.empty]\nname = \"\"");
        match result {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "queues.empty.name"),
            other => panic!("expected invalid value error, got {:?}", other),
        }

        let result = Settings::from_toml_str("[markers.Nothing]\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.queues.len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let result = Settings::load(&path);
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
        assert!(Settings::load_or_default(Some(&path)).is_err());
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[listener\n").unwrap();

        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
