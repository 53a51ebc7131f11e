//! Laudo module - assembles inspection reports from the field-app workbook.
//!
//! The pieces, leaf to root:
//! - `tables` - sheet loading and row lookup
//! - `images` - photo reference resolution inside the workspace
//! - `photos` - two-column photo blocks with continuous figure numbering
//! - `tag_repair` - fixes the known malformed loop tag in the template
//! - `context` - the field mapping handed to the template
//! - `generator` - drives one report from workbook to `.docx`
//! - `engine` - the DOCX template renderer

pub mod common;
pub mod config;
pub mod context;
pub mod engine;
pub mod generator;
pub mod images;
pub mod photos;
pub mod tables;
pub mod tag_repair;
pub mod traits;

pub use config::LaudoConfig;
pub use engine::{DocxRenderEngine, RenderError};
pub use generator::LaudoGenerator;
pub use traits::TemplateRenderer;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort report generation.
#[derive(Debug, Error)]
pub enum LaudoError {
    #[error("ID_Vistoria '{id}' not found in sheet {table}")]
    InspectionNotFound { id: String, table: String },
    #[error("failed to read spreadsheet {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to open template archive {path}: {source}")]
    TemplateArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render template: {0}")]
    Render(#[from] RenderError),
}

impl LaudoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LaudoError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LaudoError::InspectionNotFound { .. })
    }
}

/// Result of a successful report generation.
#[derive(Debug, Clone)]
pub struct GeneratedLaudo {
    pub filename: String,
    pub path: PathBuf,
}
