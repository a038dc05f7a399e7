// src/handlers/dashboard.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{common::error::AppError, config::AppState, models::stats::ClientStatistics};

// GET /api/dashboard/statistics
#[utoipa::path(
    get,
    path = "/api/dashboard/statistics",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Rentabilidade de todos os clientes ativos", body = Vec<ClientStatistics>)
    )
)]
pub async fn all_statistics(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.stats_service.all_statistics().await?;
    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/clients/{id}/statistics
#[utoipa::path(
    get,
    path = "/api/clients/{id}/statistics",
    tag = "Dashboard",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Indicadores do cliente", body = ClientStatistics),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn client_statistics(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.stats_service.client_statistics(id).await?;
    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Dashboard",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
