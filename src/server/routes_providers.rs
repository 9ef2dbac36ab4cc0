use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use orchestrator_common::{Preset, PresetSummary};
use serde::Serialize;

use super::error::AppError;
use crate::server::AppContext;
use crate::service::ProviderDescription;

pub fn provider_routes() -> Router<AppContext> {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/providers/:name", get(get_provider))
        .route("/providers/:name/presets", post(create_preset))
        .route(
            "/providers/:name/presets/:preset",
            get(get_preset).delete(delete_preset),
        )
}

async fn list_providers(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.service.provider_names())
}

async fn get_provider(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<ProviderDescription>, AppError> {
    Ok(Json(ctx.service.describe_provider(&name).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePresetResponse {
    preset_id: String,
}

async fn create_preset(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(preset): Json<Preset>,
) -> Result<impl IntoResponse, AppError> {
    let preset_id = ctx.service.create_preset(&name, &preset).await?;
    tracing::info!(provider = %name, preset = %preset.name, "preset created via API");
    Ok((StatusCode::CREATED, Json(CreatePresetResponse { preset_id })))
}

async fn get_preset(
    State(ctx): State<AppContext>,
    Path((name, preset)): Path<(String, String)>,
) -> Result<Json<PresetSummary>, AppError> {
    Ok(Json(ctx.service.get_preset(&name, &preset).await?))
}

async fn delete_preset(
    State(ctx): State<AppContext>,
    Path((name, preset)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    ctx.service.delete_preset(&name, &preset).await?;
    Ok(StatusCode::NO_CONTENT)
}
