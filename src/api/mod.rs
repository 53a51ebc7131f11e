//! HTTP surface: `POST /generate`.

pub mod handlers;
pub mod model;
pub mod workspace;

pub use handlers::{ApiState, GenerateError};
pub use model::{GenerateRequest, GenerateResponse, ImagePayload};

use actix_web::web;

/// Workbook, template and photos all travel base64-encoded in one body.
pub const MAX_JSON_PAYLOAD: usize = 256 * 1024 * 1024;

/// Register the report routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_PAYLOAD))
        .service(web::resource("/generate").route(web::post().to(handlers::generate)));
}
