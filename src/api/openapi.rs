//! OpenAPI specification endpoints

use actix_web::{get, HttpResponse, Responder};
use utoipa::OpenApi;

use crate::api::{health, scan, schedule};
use crate::model::{
    ModelTarget, ProjectConfig, Query, ResilienceScore, Scan, ScanMetrics, ScanStatus,
    ScheduleSpec, Turn, TurnMetrics,
};
use crate::service::scan::{QueueSnapshot, QueueStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        scan::start_scan,
        scan::get_scan,
        scan::list_turns,
        scan::update_status,
        scan::get_progress,
        schedule::next_run,
        health::liveness,
        health::readiness,
    ),
    components(schemas(
        scan::StartScanRequest,
        scan::StartScanResponse,
        scan::StatusUpdateRequest,
        scan::ScanTurnsResponse,
        schedule::NextRunRequest,
        schedule::NextRunResponse,
        health::HealthStatus,
        health::ReadinessStatus,
        health::DependencyHealth,
        ProjectConfig,
        Query,
        ModelTarget,
        ScheduleSpec,
        Scan,
        ScanStatus,
        ScanMetrics,
        ResilienceScore,
        Turn,
        TurnMetrics,
        QueueStatus,
        QueueSnapshot,
    )),
    tags(
        (name = "scans", description = "Scan execution and control"),
        (name = "schedule", description = "Schedule calculations"),
        (name = "health", description = "Health probes")
    ),
    info(
        title = "GeoPulse API",
        description = "Generative engine visibility monitoring"
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
