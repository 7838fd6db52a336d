//! REST API endpoints for scans

use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::app::AppState;
use crate::model::{ModelTarget, ProjectConfig, Scan, Turn};
use crate::service::scan::{QueueSnapshot, QueueStatus};

/// Request body for starting a scan
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartScanRequest {
    pub project: ProjectConfig,
    pub models: Vec<ModelTarget>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartScanResponse {
    pub scan_id: Uuid,
    pub status: QueueStatus,
}

/// Request body for pause/resume/cancel
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: QueueStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanTurnsResponse {
    pub scan_id: Uuid,
    pub turns: Vec<Turn>,
}

/// Start a scan in the background
#[utoipa::path(
    post,
    path = "/v1/scans",
    request_body = StartScanRequest,
    responses(
        (status = 202, description = "Scan accepted and started", body = StartScanResponse),
        (status = 400, description = "Invalid scan request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "scans"
)]
#[post("/v1/scans")]
pub async fn start_scan(
    state: web::Data<AppState>,
    body: web::Json<StartScanRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();

    if request.project.queries.is_empty() {
        return Err(ApiError::BadRequest("project has no queries".to_string()));
    }
    if request.models.is_empty() {
        return Err(ApiError::BadRequest("no models requested".to_string()));
    }

    let scan_id = Uuid::new_v4();
    state.queue.set_status(scan_id, QueueStatus::Pending).await?;

    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        if let Err(e) = orchestrator
            .run_scan(scan_id, &request.project, &request.models)
            .await
        {
            tracing::error!(scan = %scan_id, error = %e, "Background scan ended with error");
        }
    });

    tracing::info!(scan = %scan_id, "Scan accepted");
    Ok(HttpResponse::Accepted().json(StartScanResponse {
        scan_id,
        status: QueueStatus::Pending,
    }))
}

/// Get a scan by ID
#[utoipa::path(
    get,
    path = "/v1/scans/{id}",
    params(
        ("id" = Uuid, Path, description = "Scan ID")
    ),
    responses(
        (status = 200, description = "Scan retrieved successfully", body = Scan),
        (status = 404, description = "Scan not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "scans"
)]
#[get("/v1/scans/{id}")]
pub async fn get_scan(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let scan = state.store.get_scan(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(scan))
}

/// List all conversation turns of a scan
#[utoipa::path(
    get,
    path = "/v1/scans/{id}/turns",
    params(
        ("id" = Uuid, Path, description = "Scan ID")
    ),
    responses(
        (status = 200, description = "Turns retrieved successfully", body = ScanTurnsResponse),
        (status = 404, description = "Scan not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "scans"
)]
#[get("/v1/scans/{id}/turns")]
pub async fn list_turns(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let scan_id = path.into_inner();
    // Resolve the scan first so an unknown ID is a 404, not an empty list
    state.store.get_scan(scan_id).await?;
    let turns = state.store.list_turns(scan_id).await?;
    Ok(HttpResponse::Ok().json(ScanTurnsResponse { scan_id, turns }))
}

/// Pause, resume or cancel a running scan
#[utoipa::path(
    post,
    path = "/v1/scans/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Scan ID")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Invalid status transition"),
        (status = 404, description = "Scan not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "scans"
)]
#[post("/v1/scans/{id}/status")]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let scan_id = path.into_inner();
    let status = body.into_inner().status;

    if status == QueueStatus::Pending {
        return Err(ApiError::BadRequest(
            "scans cannot be moved back to pending".to_string(),
        ));
    }

    state.store.get_scan(scan_id).await?;
    state.queue.set_status(scan_id, status).await?;

    tracing::info!(scan = %scan_id, status = ?status, "Scan status updated");
    Ok(HttpResponse::NoContent().finish())
}

/// Get the queue progress of a scan
#[utoipa::path(
    get,
    path = "/v1/scans/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Scan ID")
    ),
    responses(
        (status = 200, description = "Progress retrieved successfully", body = QueueSnapshot),
        (status = 404, description = "Scan has no queue record"),
        (status = 500, description = "Internal server error")
    ),
    tag = "scans"
)]
#[get("/v1/scans/{id}/progress")]
pub async fn get_progress(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let scan_id = path.into_inner();
    let snapshot = state
        .queue
        .snapshot(scan_id)
        .await?
        .ok_or(ApiError::ScanNotFound(scan_id))?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Configure scan routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(start_scan)
        .service(get_scan)
        .service(list_turns)
        .service(update_status)
        .service(get_progress);
}
