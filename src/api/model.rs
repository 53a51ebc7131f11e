use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A photo shipped with the request, stored at `path` inside the workspace.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImagePayload {
    /// Relative path as referenced by the workbook, e.g. `Fotos_imovel_Images/f1.jpg`.
    pub path: String,
    pub base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Inspection identifier (`ID_Vistoria`).
    pub id_vistoria: String,
    /// The field-app workbook.
    pub excel_base64: String,
    /// Report template; the server default is used when absent.
    #[serde(default)]
    pub template_base64: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub filename: String,
    pub docx_base64: String,
}
