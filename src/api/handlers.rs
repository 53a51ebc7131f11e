use std::fs;
use std::path::{Path, PathBuf};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{error, info, warn};
use thiserror::Error;

use super::model::{GenerateRequest, GenerateResponse};
use super::workspace::{Workspace, WorkspaceError};
use crate::laudo::config::{DEFAULT_EXCEL_FILE, DEFAULT_TEMPLATE_FILE};
use crate::laudo::{LaudoConfig, LaudoError, LaudoGenerator};
use crate::metrics::{REPORTS_FAILED, REPORTS_GENERATED};
use crate::ErrorResponse;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Template copied into workspaces whose request carries none.
    pub default_template: PathBuf,
}

impl ApiState {
    pub fn new(default_template: impl Into<PathBuf>) -> Self {
        Self {
            default_template: default_template.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Laudo(#[from] LaudoError),
    #[error("failed to read generated report {path}: {source}")]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("report worker failed: {0}")]
    Blocking(String),
}

impl ResponseError for GenerateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerateError::BadRequest(_) | GenerateError::Workspace(WorkspaceError::UnsafePath(_)) => {
                StatusCode::BAD_REQUEST
            }
            GenerateError::Laudo(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let body = match self.status_code() {
            StatusCode::BAD_REQUEST => ErrorResponse::bad_request(&message),
            StatusCode::NOT_FOUND => ErrorResponse::not_found(&message),
            _ => ErrorResponse::internal_error(&message),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

fn decode_field(field: &str, data: &str) -> Result<Vec<u8>, GenerateError> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| GenerateError::BadRequest(format!("invalid base64 in {field}: {e}")))
}

/// Materialize the request in a fresh workspace and run the report there.
/// The workspace is gone when this returns.
pub fn generate_report(
    request: GenerateRequest,
    default_template: &Path,
) -> Result<GenerateResponse, GenerateError> {
    let id_vistoria = request.id_vistoria.trim().to_string();
    if id_vistoria.is_empty() {
        return Err(GenerateError::BadRequest(
            "id_vistoria is required".to_string(),
        ));
    }

    let excel = decode_field("excel_base64", &request.excel_base64)?;
    let template = request
        .template_base64
        .as_deref()
        .map(|data| decode_field("template_base64", data))
        .transpose()?;
    let images = request
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|image| {
            let data = decode_field(&format!("images[{}]", image.path), &image.base64)?;
            Ok((image.path, data))
        })
        .collect::<Result<Vec<_>, GenerateError>>()?;

    let workspace = Workspace::create()?;
    workspace.write_file(DEFAULT_EXCEL_FILE, &excel)?;
    match template {
        Some(data) => {
            workspace.write_file(DEFAULT_TEMPLATE_FILE, &data)?;
        }
        None if default_template.is_file() => {
            workspace.copy_in(default_template, DEFAULT_TEMPLATE_FILE)?;
        }
        None => warn!(
            "No template in request and default template {} is missing",
            default_template.display()
        ),
    }
    for (path, data) in &images {
        workspace.write_file(path, data)?;
    }

    let generator = LaudoGenerator::new(LaudoConfig::for_workspace(workspace.path()));
    let report = generator.generate(&id_vistoria)?;
    let docx = fs::read(&report.path).map_err(|source| GenerateError::ReadOutput {
        path: report.path.clone(),
        source,
    })?;

    Ok(GenerateResponse {
        filename: report.filename,
        docx_base64: STANDARD.encode(docx),
    })
}

#[utoipa::path(
    tag = "Laudo",
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Report generated", body = GenerateResponse),
        (status = 400, description = "Invalid base64 payload or unsafe image path", body = ErrorResponse),
        (status = 404, description = "ID_Vistoria not found in the workbook", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn generate(
    state: web::Data<ApiState>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse, GenerateError> {
    let request = body.into_inner();
    info!(
        "Generating report for {} ({} image(s))",
        request.id_vistoria,
        request.images.as_ref().map_or(0, Vec::len)
    );

    let default_template = state.default_template.clone();
    let result = web::block(move || generate_report(request, &default_template))
        .await
        .map_err(|e| GenerateError::Blocking(e.to_string()))
        .and_then(|result| result);

    match result {
        Ok(response) => {
            REPORTS_GENERATED.inc();
            info!("Report {} generated", response.filename);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            REPORTS_FAILED.inc();
            error!("Report generation failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GenerateError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GenerateError::Workspace(WorkspaceError::UnsafePath("../x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        let not_found = LaudoError::InspectionNotFound {
            id: "V9".into(),
            table: "Vistoria".into(),
        };
        assert_eq!(
            GenerateError::Laudo(not_found).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GenerateError::Blocking("canceled".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_base64_is_bad_request() {
        let request = GenerateRequest {
            id_vistoria: "V001".into(),
            excel_base64: "not base64!".into(),
            template_base64: None,
            images: None,
        };
        let err = generate_report(request, Path::new("missing.docx")).unwrap_err();
        assert!(matches!(err, GenerateError::BadRequest(_)));
    }

    #[test]
    fn test_blank_id_is_bad_request() {
        let request = GenerateRequest {
            id_vistoria: "  ".into(),
            excel_base64: String::new(),
            template_base64: None,
            images: None,
        };
        let err = generate_report(request, Path::new("missing.docx")).unwrap_err();
        assert!(matches!(err, GenerateError::BadRequest(_)));
    }
}
