// src/handlers/materials.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::catalog::Material};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Mulch")]
    pub name: String,

    #[validate(range(min = 0.0, message = "O custo não pode ser negativo."))]
    #[schema(example = 5.5)]
    pub default_cost: f64,

    #[schema(example = "bag")]
    pub unit: Option<String>,

    // Materiais globais aparecem para todos os clientes.
    #[serde(default = "default_is_global")]
    pub is_global: bool,

    pub description: Option<String>,
}

fn default_is_global() -> bool {
    true
}

// POST /api/materials
#[utoipa::path(
    post,
    path = "/api/materials",
    tag = "Materiais",
    request_body = MaterialPayload,
    responses(
        (status = 201, description = "Material criado", body = Material),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Nome já cadastrado")
    )
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let material = app_state
        .catalog_service
        .create_material(
            &payload.name,
            payload.default_cost,
            payload.unit.as_deref(),
            payload.is_global,
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(material)))
}

// GET /api/materials
#[utoipa::path(
    get,
    path = "/api/materials",
    tag = "Materiais",
    responses(
        (status = 200, description = "Catálogo de materiais e serviços", body = Vec<Material>)
    )
)]
pub async fn list_materials(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let materials = app_state.catalog_service.list_materials().await?;
    Ok((StatusCode::OK, Json(materials)))
}

// PUT /api/materials/{id}
#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    tag = "Materiais",
    params(("id" = i64, Path, description = "ID do material")),
    request_body = MaterialPayload,
    responses(
        (status = 200, description = "Material atualizado", body = Material),
        (status = 404, description = "Material não encontrado")
    )
)]
pub async fn update_material(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<MaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let material = app_state
        .catalog_service
        .update_material(
            id,
            &payload.name,
            payload.default_cost,
            payload.unit.as_deref(),
            payload.is_global,
            payload.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(material)))
}

// DELETE /api/materials/{id}
#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    tag = "Materiais",
    params(("id" = i64, Path, description = "ID do material")),
    responses(
        (status = 204, description = "Material removido"),
        (status = 404, description = "Material não encontrado")
    )
)]
pub async fn delete_material(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_material(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
