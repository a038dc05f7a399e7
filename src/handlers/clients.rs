// src/handlers/clients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::catalog::{Client, ClientMaterial, ClientMaterialDetail},
};

// =============================================================================
//  ÁREA 1: CADASTRO DE CLIENTES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Smith Residence")]
    pub name: String,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,

    #[validate(range(min = 0.0, message = "A mensalidade não pode ser negativa."))]
    #[serde(default)]
    #[schema(example = 350.0)]
    pub monthly_charge: f64,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    // Default: só os ativos. `?active=false` traz todo mundo.
    pub active: Option<bool>,
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clientes",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let client = app_state
        .catalog_service
        .create_client(
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.address.as_deref(),
            payload.monthly_charge,
            payload.notes.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clientes",
    params(
        ("active" = Option<bool>, Query, description = "true (default) = só ativos")
    ),
    responses(
        (status = 200, description = "Lista de clientes", body = Vec<Client>)
    )
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    Query(query): Query<ListClientsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state
        .catalog_service
        .list_clients(query.active.unwrap_or(true))
        .await?;

    Ok((StatusCode::OK, Json(clients)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.catalog_service.get_client(id).await?;
    Ok((StatusCode::OK, Json(client)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let client = app_state
        .catalog_service
        .update_client(
            id,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.address.as_deref(),
            payload.monthly_charge,
            payload.notes.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/clients/{id}/deactivate",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente desativado (histórico preservado)", body = Client),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn deactivate_client(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.catalog_service.set_client_active(id, false).await?;
    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/activate
#[utoipa::path(
    post,
    path = "/api/clients/{id}/activate",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente reativado, mesmo id e histórico", body = Client),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn activate_client(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.catalog_service.set_client_active(id, true).await?;
    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido, visitas e preços em cascata"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_client(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: PREÇOS POR CLIENTE
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientMaterialPayload {
    // null = associa mantendo o custo default do material
    #[validate(range(min = 0.0, message = "O custo não pode ser negativo."))]
    #[schema(example = 4.75)]
    pub custom_cost: Option<f64>,
}

// PUT /api/clients/{id}/materials/{material_id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}/materials/{material_id}",
    tag = "Clientes",
    params(
        ("id" = i64, Path, description = "ID do cliente"),
        ("material_id" = i64, Path, description = "ID do material")
    ),
    request_body = ClientMaterialPayload,
    responses(
        (status = 200, description = "Preço específico definido (upsert)", body = ClientMaterial),
        (status = 404, description = "Cliente ou material não encontrado")
    )
)]
pub async fn set_client_material(
    State(app_state): State<AppState>,
    Path((id, material_id)): Path<(i64, i64)>,
    Json(payload): Json<ClientMaterialPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let row = app_state
        .catalog_service
        .set_client_material(id, material_id, payload.custom_cost)
        .await?;

    Ok((StatusCode::OK, Json(row)))
}

// GET /api/clients/{id}/materials
#[utoipa::path(
    get,
    path = "/api/clients/{id}/materials",
    tag = "Clientes",
    params(("id" = i64, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Materiais com o custo efetivo do cliente", body = Vec<ClientMaterialDetail>),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn list_client_materials(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.catalog_service.list_client_materials(id).await?;
    Ok((StatusCode::OK, Json(rows)))
}

// DELETE /api/clients/{id}/materials/{material_id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}/materials/{material_id}",
    tag = "Clientes",
    params(
        ("id" = i64, Path, description = "ID do cliente"),
        ("material_id" = i64, Path, description = "ID do material")
    ),
    responses(
        (status = 204, description = "Preço específico removido; volta a valer o default"),
        (status = 404, description = "Associação não encontrada")
    )
)]
pub async fn remove_client_material(
    State(app_state): State<AppState>,
    Path((id, material_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .catalog_service
        .remove_client_material(id, material_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
