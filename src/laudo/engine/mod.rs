//! DOCX rendering engine.
//!
//! Opens the template package, turns each text part that carries tags into a
//! [`Template`], renders it against the context and writes a new package.
//! Inline images are copied into `word/media` and linked from the part that
//! shows them.

mod package;
pub mod preprocess;
pub mod template;
pub mod value;

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::traits::TemplateRenderer;
use package::DocxPackage;

pub use template::Template;
pub use value::{Context, InlineImage, Value};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid DOCX archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("template syntax error: {0}")]
    Syntax(String),
    #[error("unsupported tag '{{% {0} %}}'")]
    UnsupportedTag(String),
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("'{path}' is a {kind} and cannot be printed")]
    NotRenderable { path: String, kind: &'static str },
    #[error("'{path}' is a {kind} and cannot be looped over")]
    NotIterable { path: String, kind: &'static str },
    #[error("cannot read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("in {part}: {source}")]
    InPart {
        part: String,
        #[source]
        source: Box<RenderError>,
    },
}

/// The body, headers and footers; the parts that may carry tags.
fn is_text_part(name: &str) -> bool {
    if name == "word/document.xml" {
        return true;
    }
    match name.strip_prefix("word/") {
        Some(rest) => {
            !rest.contains('/')
                && rest.ends_with(".xml")
                && (rest.starts_with("header") || rest.starts_with("footer"))
        }
        None => false,
    }
}

fn has_tags(xml: &str) -> bool {
    xml.contains("{{") || xml.contains("{%") || xml.contains("{#")
}

/// Stateless DOCX renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderEngine;

impl DocxRenderEngine {
    pub fn new() -> Self {
        Self
    }

    fn render_part(
        package: &mut DocxPackage,
        part: &str,
        context: &Context,
    ) -> Result<(), RenderError> {
        let xml = package.text(part)?;
        if !has_tags(&xml) {
            return Ok(());
        }
        let prepared = preprocess::prepare(&xml)?;
        let template = Template::parse(&prepared)?;
        let rendered = template.render(context, &mut |image| package.embed_image(part, image))?;
        package.set(part, rendered.into_bytes());
        Ok(())
    }
}

impl TemplateRenderer for DocxRenderEngine {
    fn render(&self, template: &Path, context: &Context, output: &Path) -> Result<(), RenderError> {
        if !template.is_file() {
            return Err(RenderError::TemplateNotFound(template.to_path_buf()));
        }
        let mut package = DocxPackage::open(template)?;

        let parts: Vec<String> = package
            .names()
            .filter(|name| is_text_part(name))
            .map(str::to_string)
            .collect();

        for part in &parts {
            Self::render_part(&mut package, part, context).map_err(|source| {
                RenderError::InPart {
                    part: part.clone(),
                    source: Box::new(source),
                }
            })?;
        }

        package.save(output)?;
        log::debug!(
            "Rendered {} part(s) of {} into {}",
            parts.len(),
            template.display(),
            output.display()
        );
        Ok(())
    }
}
