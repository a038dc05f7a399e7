// src/handlers/visits.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::visit::{Visit, VisitMaterial, VisitMaterialDetail},
    services::row_validator::parse_time,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitPayload {
    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub visit_date: NaiveDate,

    // Aceita os mesmos formatos flexíveis da importação ("9:30", "09:30",
    // "9:30 AM", "930").
    #[validate(length(min = 1, message = "O horário de início é obrigatório."))]
    #[schema(example = "09:30")]
    pub start_time: String,

    #[validate(length(min = 1, message = "O horário de término é obrigatório."))]
    #[schema(example = "11:45")]
    pub end_time: String,

    pub notes: Option<String>,
}

impl VisitPayload {
    fn parsed_times(&self) -> Result<(NaiveTime, NaiveTime), AppError> {
        let start = parse_time(&self.start_time).ok_or_else(|| {
            AppError::FormatError(format!("Horário de início inválido: '{}'", self.start_time))
        })?;
        let end = parse_time(&self.end_time).ok_or_else(|| {
            AppError::FormatError(format!("Horário de término inválido: '{}'", self.end_time))
        })?;
        Ok((start, end))
    }
}

// POST /api/clients/{id}/visits
#[utoipa::path(
    post,
    path = "/api/clients/{id}/visits",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID do cliente")),
    request_body = VisitPayload,
    responses(
        (status = 201, description = "Visita registrada", body = Visit),
        (status = 400, description = "Horários inválidos (término antes do início)"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (start, end) = payload.parsed_times()?;

    let visit = app_state
        .visit_service
        .create_visit(id, payload.visit_date, start, end, payload.notes.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// GET /api/clients/{id}/visits
#[utoipa::path(
    get,
    path = "/api/clients/{id}/visits",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Visitas do cliente, mais recentes primeiro", body = Vec<Visit>),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn list_client_visits(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let visits = app_state.visit_service.list_for_client(id).await?;
    Ok((StatusCode::OK, Json(visits)))
}

// PUT /api/visits/{id}
#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID da visita")),
    request_body = VisitPayload,
    responses(
        (status = 200, description = "Visita atualizada", body = Visit),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (start, end) = payload.parsed_times()?;

    let visit = app_state
        .visit_service
        .update_visit(id, payload.visit_date, start, end, payload.notes.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(visit)))
}

// DELETE /api/visits/{id}
#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID da visita")),
    responses(
        (status = 204, description = "Visita removida"),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn delete_visit(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.visit_service.delete_visit(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  MATERIAIS CONSUMIDOS NA VISITA
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitMaterialPayload {
    pub material_id: i64,

    #[validate(range(min = 0.0, message = "A quantidade não pode ser negativa."))]
    #[schema(example = 3.0)]
    pub quantity: f64,
}

// POST /api/visits/{id}/materials
#[utoipa::path(
    post,
    path = "/api/visits/{id}/materials",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID da visita")),
    request_body = VisitMaterialPayload,
    responses(
        (status = 201, description = "Material registrado na visita", body = VisitMaterial),
        (status = 404, description = "Visita ou material não encontrado")
    )
)]
pub async fn add_visit_material(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<VisitMaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let row = app_state
        .visit_service
        .add_material(id, payload.material_id, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

// GET /api/visits/{id}/materials
#[utoipa::path(
    get,
    path = "/api/visits/{id}/materials",
    tag = "Visitas",
    params(("id" = i64, Path, description = "ID da visita")),
    responses(
        (status = 200, description = "Materiais da visita com custo efetivo atual", body = Vec<VisitMaterialDetail>),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn list_visit_materials(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.visit_service.list_materials(id).await?;
    Ok((StatusCode::OK, Json(rows)))
}

// DELETE /api/visits/{id}/materials/{visit_material_id}
#[utoipa::path(
    delete,
    path = "/api/visits/{id}/materials/{visit_material_id}",
    tag = "Visitas",
    params(
        ("id" = i64, Path, description = "ID da visita"),
        ("visit_material_id" = i64, Path, description = "ID da linha visita-material")
    ),
    responses(
        (status = 204, description = "Material removido da visita"),
        (status = 404, description = "Linha não encontrada")
    )
)]
pub async fn remove_visit_material(
    State(app_state): State<AppState>,
    Path((_id, visit_material_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.visit_service.remove_material(visit_material_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
