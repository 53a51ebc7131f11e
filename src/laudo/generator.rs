//! Report driver: workbook and template in, `.docx` out.
//!
//! One call walks Loaded -> Resolved -> Rendered -> Saved. Any failure stops
//! the run with a [`LaudoError`] and leaves no output file behind.

use std::fs;

use super::common::report_filename;
use super::context::{build_context, InspectionRows, PhotoSections};
use super::engine::DocxRenderEngine;
use super::images::ImageResolver;
use super::tables::InspectionTables;
use super::tag_repair::repair_template;
use super::traits::TemplateRenderer;
use super::{GeneratedLaudo, LaudoConfig, LaudoError};

/// Generates inspection reports for one workspace.
pub struct LaudoGenerator<R: TemplateRenderer = DocxRenderEngine> {
    config: LaudoConfig,
    renderer: R,
}

impl LaudoGenerator<DocxRenderEngine> {
    pub fn new(config: LaudoConfig) -> Self {
        Self::with_renderer(config, DocxRenderEngine)
    }
}

impl<R: TemplateRenderer> LaudoGenerator<R> {
    pub fn with_renderer(config: LaudoConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    pub fn config(&self) -> &LaudoConfig {
        &self.config
    }

    /// Build the report for `id_vistoria` and write it under the output
    /// directory as `Laudo_<client>.docx`.
    pub fn generate(&self, id_vistoria: &str) -> Result<GeneratedLaudo, LaudoError> {
        let id_vistoria = id_vistoria.trim();
        let tables = InspectionTables::load(&self.config.excel_path())?;

        let rows = InspectionRows::resolve(&tables, id_vistoria)?;
        let images = ImageResolver::new(self.config.workspace());
        let sections = PhotoSections::assemble(&tables, id_vistoria, &images);
        let context = build_context(&rows, &sections, &images);

        let template = self.config.template_path();
        repair_template(&template)?;

        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir).map_err(|e| LaudoError::io(&output_dir, e))?;

        let client = rows.vistoria.text("Contratante");
        let filename = report_filename(&client, id_vistoria);
        let path = output_dir.join(&filename);

        self.renderer.render(&template, &context, &path)?;

        log::info!("Report for {} written to {}", id_vistoria, path.display());
        Ok(GeneratedLaudo { filename, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laudo::engine::{Context, RenderError};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Records the context instead of producing a document.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<(PathBuf, Context)>>,
    }

    impl TemplateRenderer for &RecordingRenderer {
        fn render(
            &self,
            _template: &Path,
            context: &Context,
            output: &Path,
        ) -> Result<(), RenderError> {
            self.calls
                .borrow_mut()
                .push((output.to_path_buf(), context.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_missing_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RecordingRenderer::default();
        let generator =
            LaudoGenerator::with_renderer(LaudoConfig::for_workspace(dir.path()), &recorder);

        let err = generator.generate("V001").unwrap_err();
        assert!(matches!(err, LaudoError::Spreadsheet { .. }));
        assert!(recorder.calls.borrow().is_empty());
        assert!(!dir.path().join("saida").exists());
    }
}
