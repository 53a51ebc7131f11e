//! Workspace layout for one report run.

use std::path::{Path, PathBuf};

pub const DEFAULT_EXCEL_FILE: &str = "Vistoria.xlsx";
pub const DEFAULT_TEMPLATE_FILE: &str = "Modelo_Vistoria.docx";
pub const DEFAULT_OUTPUT_DIR: &str = "saida";

/// Where the workbook, template, photos and output live for a single run.
///
/// Passed explicitly into every entry point; nothing reads paths from the
/// process environment once a config exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaudoConfig {
    pub workspace: PathBuf,
    pub excel_file: String,
    pub template_file: String,
    pub output_dir: String,
}

impl LaudoConfig {
    /// Standard file names under `workspace`.
    pub fn for_workspace(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            excel_file: DEFAULT_EXCEL_FILE.to_string(),
            template_file: DEFAULT_TEMPLATE_FILE.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn excel_path(&self) -> PathBuf {
        self.workspace.join(&self.excel_file)
    }

    pub fn template_path(&self) -> PathBuf {
        self.workspace.join(&self.template_file)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.workspace.join(&self.output_dir)
    }
}
