//! View rendering collaborator.
//!
//! The dispatcher only needs "given a view name and a model, produce HTML".
//! [`TemplateViews`] provides that with minijinja templates loaded from a
//! directory (`User/Register` -> `<dir>/User/Register.html`) or registered in
//! memory.

use minijinja::Environment;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Why a view could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// No template is known under this name.
    NotFound { name: String },
    /// The name escapes the view directory or is otherwise unusable.
    InvalidName { name: String },
    /// The template failed to compile or render.
    Template { name: String, message: String },
    /// The template file exists but could not be read.
    Io { name: String, message: String },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::NotFound { name } => write!(f, "view '{name}' not found"),
            ViewError::InvalidName { name } => write!(f, "invalid view name '{name}'"),
            ViewError::Template { name, message } => {
                write!(f, "view '{name}' failed to render: {message}")
            }
            ViewError::Io { name, message } => write!(f, "view '{name}' could not be read: {message}"),
        }
    }
}

impl std::error::Error for ViewError {}

/// Renders a named view with a model into HTML.
pub trait ViewRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ViewError`] when the view is unknown or fails to render.
    fn render_view(&self, name: &str, model: &Value) -> Result<String, ViewError>;
}

/// minijinja-backed views. HTML is auto-escaped.
#[derive(Debug, Clone, Default)]
pub struct TemplateViews {
    base_dir: Option<PathBuf>,
    inline: HashMap<String, String>,
}

impl TemplateViews {
    /// Views loaded from files under `base`.
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: Some(base.into()),
            inline: HashMap::new(),
        }
    }

    /// Views registered with [`TemplateViews::with_template`] only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Register a template source under `name`. Takes precedence over files.
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.inline.insert(name.into(), source.into());
        self
    }

    fn map_path(&self, name: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone()?;
        for comp in Path::new(name.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if pb.extension().is_none() {
            pb.set_extension("html");
        }
        Some(pb)
    }

    fn source(&self, name: &str) -> Result<String, ViewError> {
        if let Some(source) = self.inline.get(name) {
            return Ok(source.clone());
        }
        if self.base_dir.is_none() {
            return Err(ViewError::NotFound {
                name: name.to_string(),
            });
        }
        let path = self.map_path(name).ok_or_else(|| ViewError::InvalidName {
            name: name.to_string(),
        })?;
        if !path.is_file() {
            return Err(ViewError::NotFound {
                name: name.to_string(),
            });
        }
        fs::read_to_string(&path).map_err(|e| ViewError::Io {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

impl ViewRenderer for TemplateViews {
    fn render_view(&self, name: &str, model: &Value) -> Result<String, ViewError> {
        let source = self.source(name)?;
        let template_error = |e: minijinja::Error| ViewError::Template {
            name: name.to_string(),
            message: e.to_string(),
        };
        let mut env = Environment::new();
        env.add_template("view.html", &source)
            .map_err(template_error)?;
        let rendered = env
            .get_template("view.html")
            .and_then(|t| t.render(model))
            .map_err(template_error)?;
        debug!(view = %name, bytes = rendered.len(), "View rendered");
        Ok(rendered)
    }
}
