//! REST API endpoints for schedule calculations

use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::model::ScheduleSpec;
use crate::service::schedule;

/// Request body for computing the next run of a schedule
#[derive(Debug, Deserialize, ToSchema)]
pub struct NextRunRequest {
    pub schedule: ScheduleSpec,
    /// Reference instant; defaults to the current time
    pub after: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NextRunResponse {
    /// Next run instant in UTC
    pub next_run: DateTime<Utc>,
    /// Same instant rendered in the schedule's timezone
    pub local_time: String,
    /// Human-readable schedule description
    pub description: String,
}

/// Compute the next run of a schedule
#[utoipa::path(
    post,
    path = "/v1/schedule/next-run",
    request_body = NextRunRequest,
    responses(
        (status = 200, description = "Next run computed", body = NextRunResponse),
        (status = 400, description = "Invalid schedule")
    ),
    tag = "schedule"
)]
#[post("/v1/schedule/next-run")]
pub async fn next_run(body: web::Json<NextRunRequest>) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let after = request.after.unwrap_or_else(Utc::now);

    let next = schedule::next_run(&request.schedule, after)?;
    let local_time = schedule::format_in_timezone(next, &request.schedule.timezone)?;

    Ok(HttpResponse::Ok().json(NextRunResponse {
        next_run: next,
        local_time,
        description: schedule::describe(&request.schedule),
    }))
}

/// Configure schedule routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(next_run);
}
