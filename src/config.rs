//! # Application Configuration
//!
//! Configuration is read from an optional YAML file and then overridden by
//! environment variables with the `CTRL_` prefix.
//!
//! ```yaml
//! routing:
//!   default_handler: Home
//!   default_action: Index
//!   controller_suffix: Controller
//! session:
//!   enabled: true
//!   cookie_name: CTRL_SESSION
//!   cookie_expiry_days: 3
//! views:
//!   directory: ./views
//! logging:
//!   level: info
//!   format: json
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |---|---|
//! | `CTRL_SESSION_COOKIE` | `session.cookie_name` |
//! | `CTRL_VIEWS_DIR` | `views.directory` |
//! | `CTRL_LOG_LEVEL` | `logging.level` |
//! | `CTRL_LOG_FORMAT` | `logging.format` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::server::cookies::DEFAULT_COOKIE_EXPIRY_DAYS;

/// Route naming conventions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Handler used for `/`
    pub default_handler: String,
    /// Action used for `/`
    pub default_action: String,
    /// Appended to the resolved handler name to form the type name given to
    /// the factory (`User` + `Controller`)
    pub controller_suffix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_handler: "Home".to_string(),
            default_action: "Index".to_string(),
            controller_suffix: "Controller".to_string(),
        }
    }
}

impl RoutingConfig {
    /// Type name of a handler as registered with the factory.
    #[must_use]
    pub fn type_name(&self, handler: &str) -> String {
        format!("{handler}{}", self.controller_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    /// Cookie carrying the session id
    pub cookie_name: String,
    /// Lifetime of the session cookie
    pub cookie_expiry_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: "CTRL_SESSION".to_string(),
            cookie_expiry_days: DEFAULT_COOKIE_EXPIRY_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Directory holding view templates
    pub directory: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub routing: RoutingConfig,
    pub session: SessionConfig,
    pub views: ViewsConfig,
    pub logging: LogConfig,
}

impl AppConfig {
    /// Parse a YAML document. Missing sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML for this shape.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse configuration YAML")
    }

    /// Load a YAML file without applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load the optional file, then apply `CTRL_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply `CTRL_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("CTRL_SESSION_COOKIE").filter(|v| !v.is_empty()) {
            self.session.cookie_name = name;
        }
        if let Some(dir) = lookup("CTRL_VIEWS_DIR").filter(|v| !v.is_empty()) {
            self.views.directory = Some(PathBuf::from(dir));
        }
        self.logging.apply_overrides(&lookup);
    }
}
