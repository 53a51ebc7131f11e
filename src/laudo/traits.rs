//! Seam between report assembly and document rendering.

use std::path::Path;

use super::engine::{Context, RenderError};

/// Renders a template package against a context into `output`.
pub trait TemplateRenderer {
    fn render(&self, template: &Path, context: &Context, output: &Path) -> Result<(), RenderError>;
}
