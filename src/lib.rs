use actix_web::middleware::Compress;
use actix_web::{web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod laudo;
pub mod metrics;

pub use crate::api::ApiState;
pub use crate::config::ServerConfig;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::handlers::generate),
    components(schemas(
        api::GenerateRequest,
        api::GenerateResponse,
        api::ImagePayload,
        ErrorResponse,
    )),
    tags((name = "Laudo", description = "Inspection report generation."))
)]
pub struct ApiDoc;

/// Routes shared by the server and the integration tests.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.configure(api::config)
        .service(web::resource("/metrics/laudo").route(web::get().to(metrics::laudo_metrics)));
}

pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(ApiState::new(config.default_template.clone()));

    let prometheus = PrometheusMetricsBuilder::new("vistoria_laudo")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("failed to create metrics middleware: {e}")))?;

    log::info!("Starting server at http://{}", config.bind_addr);
    log::info!("Default template: {}", config.default_template.display());

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .app_data(state.clone())
            .configure(configure_app)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
