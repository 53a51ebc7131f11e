//! Report counters exposed in the Prometheus text format.

use actix_web::{http::header::ContentType, HttpResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref REPORTS_GENERATED: IntCounter = register(
        "laudo_reports_generated_total",
        "Reports rendered successfully"
    );
    pub static ref REPORTS_FAILED: IntCounter =
        register("laudo_reports_failed_total", "Report requests that failed");
}

fn register(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric name and help are valid");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric is registered once");
    counter
}

/// Text exposition of the report counters.
pub fn render() -> Result<String, prometheus::Error> {
    lazy_static::initialize(&REPORTS_GENERATED);
    lazy_static::initialize(&REPORTS_FAILED);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `GET /metrics/laudo`
pub async fn laudo_metrics() -> HttpResponse {
    match render() {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(body),
        Err(e) => {
            log::error!("Failed to encode report metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
