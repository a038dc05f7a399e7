// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Clientes ---
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::deactivate_client,
        handlers::clients::activate_client,
        handlers::clients::delete_client,
        handlers::clients::set_client_material,
        handlers::clients::list_client_materials,
        handlers::clients::remove_client_material,

        // --- Materiais ---
        handlers::materials::create_material,
        handlers::materials::list_materials,
        handlers::materials::update_material,
        handlers::materials::delete_material,

        // --- Visitas ---
        handlers::visits::create_visit,
        handlers::visits::list_client_visits,
        handlers::visits::update_visit,
        handlers::visits::delete_visit,
        handlers::visits::add_visit_material,
        handlers::visits::list_visit_materials,
        handlers::visits::remove_visit_material,

        // --- Importação ---
        handlers::imports::import_excel,
        handlers::imports::import_ocr,
        handlers::imports::get_session,
        handlers::imports::edit_record,
        handlers::imports::accept_record,
        handlers::imports::reject_record,
        handlers::imports::accept_all,
        handlers::imports::commit_session,
        handlers::imports::discard_session,

        // --- Dashboard ---
        handlers::dashboard::all_statistics,
        handlers::dashboard::client_statistics,
        handlers::dashboard::health,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::catalog::Client,
            models::catalog::Material,
            models::catalog::ClientMaterial,
            models::catalog::ClientMaterialDetail,

            // --- Visitas ---
            models::visit::Visit,
            models::visit::VisitMaterial,
            models::visit::VisitMaterialDetail,

            // --- Importação ---
            models::import::EntityKind,
            models::import::RecordStatus,
            models::import::ImportSource,
            models::import::Resolution,
            models::import::RecordSource,
            models::import::NormalizedFields,
            models::import::StagedRecord,
            models::import::ImportSummary,
            models::import::ImportSession,
            models::import::CommitOutcome,
            models::import::CommitEntry,
            models::import::CommitReport,
            models::import::ImagePayload,

            // --- Dashboard ---
            models::stats::ClientStatistics,

            // --- Payloads ---
            handlers::clients::ClientPayload,
            handlers::clients::ClientMaterialPayload,
            handlers::materials::MaterialPayload,
            handlers::visits::VisitPayload,
            handlers::visits::VisitMaterialPayload,
            handlers::imports::OcrImportPayload,
            handlers::imports::EditRecordPayload,
            handlers::imports::CommitPayload,
        )
    ),
    tags(
        (name = "Clientes", description = "Cadastro e preços por cliente"),
        (name = "Materiais", description = "Catálogo de materiais e serviços"),
        (name = "Visitas", description = "Registro de visitas e consumo de material"),
        (name = "Importação", description = "Importação por planilha e por OCR, com staging"),
        (name = "Dashboard", description = "Indicadores de rentabilidade")
    )
)]
pub struct ApiDoc;
