use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use orchestrator_common::{Error, JobId, JobStatus, Preset};
use serde::Deserialize;

use super::error::AppError;
use crate::server::AppContext;

pub fn job_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/cancel", post(cancel_job))
}

#[derive(Deserialize)]
struct CreateJobRequest {
    provider: String,
    source: String,
    #[serde(default)]
    presets: Vec<Preset>,
}

async fn create_job(
    State(ctx): State<AppContext>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = ctx
        .service
        .transcode(&payload.provider, &payload.source, &payload.presets)
        .await?;
    Ok((StatusCode::CREATED, Json(status)))
}

fn parse_job_id(id: &str) -> Result<JobId, AppError> {
    id.parse()
        .map_err(|_| AppError(Error::not_found("job", id)))
}

async fn get_job(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, AppError> {
    let id = parse_job_id(&id)?;
    Ok(Json(ctx.service.job_status(id).await?))
}

async fn cancel_job(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, AppError> {
    let id = parse_job_id(&id)?;
    Ok(Json(ctx.service.cancel_job(id).await?))
}
