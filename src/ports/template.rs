//! Template engine port.
//!
//! No engine ships with the crate. Applications plug one in by implementing
//! [`TemplateEnvironment`] and hand it to [`crate::adapters::render::template`].
use std::sync::Arc;

use eyre::Result;
use serde_json::{Map, Value};

/// Variables passed to a template.
pub type TemplateVars = Map<String, Value>;

/// A loaded template.
pub trait Template: Send + Sync {
    /// Render with the given variables.
    fn render(&self, vars: &TemplateVars) -> Result<String>;
}

/// Looks templates up by name.
pub trait TemplateEnvironment: Send + Sync {
    /// Load `name`. Called once when a handler is wrapped, not per request.
    fn get_template(&self, name: &str) -> Result<Arc<dyn Template>>;
}
