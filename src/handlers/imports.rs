// src/handlers/imports.rs
//
// Superfície HTTP da pipeline de importação. O fluxo inteiro é:
// POST excel|ocr -> sessão em staging -> PATCH/accept/reject -> commit.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::import::{CommitReport, ImagePayload, ImportSession, StagedRecord},
};

// =============================================================================
//  ÁREA 1: ENTRADA (EXCEL / OCR)
// =============================================================================

// POST /api/imports/excel
// O corpo é o XLSX cru (Content-Type: application/octet-stream).
#[utoipa::path(
    post,
    path = "/api/imports/excel",
    tag = "Importação",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Sessão de staging criada", body = ImportSession),
        (status = 400, description = "Planilha malformada (aba ou coluna obrigatória ausente)")
    )
)]
pub async fn import_excel(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::FormatError("O corpo da requisição está vazio.".into()));
    }

    let session = app_state.import_service.import_excel(&body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrImportPayload {
    #[validate(length(min = 1, message = "Envie ao menos uma imagem."))]
    pub images: Vec<ImagePayload>,
}

// POST /api/imports/ocr
#[utoipa::path(
    post,
    path = "/api/imports/ocr",
    tag = "Importação",
    request_body = OcrImportPayload,
    responses(
        (status = 201, description = "Sessão criada; falhas por imagem viram diagnósticos", body = ImportSession),
        (status = 503, description = "Backend de visão não configurado")
    )
)]
pub async fn import_ocr(
    State(app_state): State<AppState>,
    Json(payload): Json<OcrImportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = app_state.import_service.import_ocr(payload.images).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// =============================================================================
//  ÁREA 2: SESSÃO DE VERIFICAÇÃO
// =============================================================================

// GET /api/imports/{session_id}
#[utoipa::path(
    get,
    path = "/api/imports/{session_id}",
    tag = "Importação",
    params(("session_id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Estado atual da sessão", body = ImportSession),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = app_state.import_service.get_session(session_id).await?;
    Ok((StatusCode::OK, Json(session)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditRecordPayload {
    // campo -> novo valor cru; valor vazio remove o campo
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    // Para visitas: autoriza o commit a criar o cliente não resolvido.
    pub create_missing: Option<bool>,
}

// PATCH /api/imports/{session_id}/records/{record_id}
#[utoipa::path(
    patch,
    path = "/api/imports/{session_id}/records/{record_id}",
    tag = "Importação",
    params(
        ("session_id" = Uuid, Path, description = "ID da sessão"),
        ("record_id" = Uuid, Path, description = "ID do registro em staging")
    ),
    request_body = EditRecordPayload,
    responses(
        (status = 200, description = "Registro re-validado após a edição", body = StagedRecord),
        (status = 404, description = "Sessão ou registro não encontrado")
    )
)]
pub async fn edit_record(
    State(app_state): State<AppState>,
    Path((session_id, record_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EditRecordPayload>,
) -> Result<impl IntoResponse, AppError> {
    let record = app_state
        .import_service
        .edit_record(session_id, record_id, payload.fields, payload.create_missing)
        .await?;

    Ok((StatusCode::OK, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct AcceptQuery {
    pub force: Option<bool>,
}

// POST /api/imports/{session_id}/records/{record_id}/accept
#[utoipa::path(
    post,
    path = "/api/imports/{session_id}/records/{record_id}/accept",
    tag = "Importação",
    params(
        ("session_id" = Uuid, Path, description = "ID da sessão"),
        ("record_id" = Uuid, Path, description = "ID do registro"),
        ("force" = Option<bool>, Query, description = "Limpa os campos problemáticos e re-valida")
    ),
    responses(
        (status = 200, description = "Registro aceito", body = StagedRecord),
        (status = 409, description = "Registro ainda tem pendências")
    )
)]
pub async fn accept_record(
    State(app_state): State<AppState>,
    Path((session_id, record_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AcceptQuery>,
) -> Result<impl IntoResponse, AppError> {
    let record = app_state
        .import_service
        .accept_record(session_id, record_id, query.force.unwrap_or(false))
        .await?;

    Ok((StatusCode::OK, Json(record)))
}

// POST /api/imports/{session_id}/records/{record_id}/reject
#[utoipa::path(
    post,
    path = "/api/imports/{session_id}/records/{record_id}/reject",
    tag = "Importação",
    params(
        ("session_id" = Uuid, Path, description = "ID da sessão"),
        ("record_id" = Uuid, Path, description = "ID do registro")
    ),
    responses(
        (status = 200, description = "Registro rejeitado", body = StagedRecord),
        (status = 404, description = "Sessão ou registro não encontrado")
    )
)]
pub async fn reject_record(
    State(app_state): State<AppState>,
    Path((session_id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let record = app_state
        .import_service
        .reject_record(session_id, record_id)
        .await?;

    Ok((StatusCode::OK, Json(record)))
}

// POST /api/imports/{session_id}/accept-all
#[utoipa::path(
    post,
    path = "/api/imports/{session_id}/accept-all",
    tag = "Importação",
    params(("session_id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Registros limpos aceitos; OCR e pendências ficam de fora", body = ImportSession),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn accept_all(
    State(app_state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = app_state.import_service.accept_all(session_id).await?;
    Ok((StatusCode::OK, Json(session)))
}

// =============================================================================
//  ÁREA 3: COMMIT / DESCARTE
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitPayload {
    // null = commita os aceitos
    pub records: Option<Vec<Uuid>>,
}

// POST /api/imports/{session_id}/commit
#[utoipa::path(
    post,
    path = "/api/imports/{session_id}/commit",
    tag = "Importação",
    params(("session_id" = Uuid, Path, description = "ID da sessão")),
    request_body = CommitPayload,
    responses(
        (status = 200, description = "Relatório por registro; a sessão é encerrada", body = CommitReport),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn commit_session(
    State(app_state): State<AppState>,
    Path(session_id): Path<Uuid>,
    payload: Option<Json<CommitPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let selected = payload.and_then(|Json(p)| p.records);

    let report = app_state.import_service.commit(session_id, selected).await?;
    Ok((StatusCode::OK, Json(report)))
}

// DELETE /api/imports/{session_id}
#[utoipa::path(
    delete,
    path = "/api/imports/{session_id}",
    tag = "Importação",
    params(("session_id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 204, description = "Sessão descartada, banco intocado"),
        (status = 404, description = "Sessão não encontrada")
    )
)]
pub async fn discard_session(
    State(app_state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.import_service.discard(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
