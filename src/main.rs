//src/main.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use paisagismo_backend::{config::AppState, docs::ApiDoc, handlers, MIGRATOR};

#[tokio::main]
async fn main() {
    // AppState::new() carrega o .env, inicializa o logger e abre o pool.
    let app_state = AppState::new().await;

    // Roda as migrações do SQLx na inicialização
    MIGRATOR
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let client_routes = Router::new()
        .route(
            "/",
            post(handlers::clients::create_client).get(handlers::clients::list_clients),
        )
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/{id}/deactivate", post(handlers::clients::deactivate_client))
        .route("/{id}/activate", post(handlers::clients::activate_client))
        .route("/{id}/materials", get(handlers::clients::list_client_materials))
        .route(
            "/{id}/materials/{material_id}",
            axum::routing::put(handlers::clients::set_client_material)
                .delete(handlers::clients::remove_client_material),
        )
        .route(
            "/{id}/visits",
            post(handlers::visits::create_visit).get(handlers::visits::list_client_visits),
        )
        .route("/{id}/statistics", get(handlers::dashboard::client_statistics));

    let material_routes = Router::new()
        .route(
            "/",
            post(handlers::materials::create_material).get(handlers::materials::list_materials),
        )
        .route(
            "/{id}",
            axum::routing::put(handlers::materials::update_material)
                .delete(handlers::materials::delete_material),
        );

    let visit_routes = Router::new()
        .route(
            "/{id}",
            axum::routing::put(handlers::visits::update_visit)
                .delete(handlers::visits::delete_visit),
        )
        .route(
            "/{id}/materials",
            post(handlers::visits::add_visit_material).get(handlers::visits::list_visit_materials),
        )
        .route(
            "/{id}/materials/{visit_material_id}",
            axum::routing::delete(handlers::visits::remove_visit_material),
        );

    let import_routes = Router::new()
        .route("/excel", post(handlers::imports::import_excel))
        .route("/ocr", post(handlers::imports::import_ocr))
        .route(
            "/{session_id}",
            get(handlers::imports::get_session).delete(handlers::imports::discard_session),
        )
        .route(
            "/{session_id}/records/{record_id}",
            patch(handlers::imports::edit_record),
        )
        .route(
            "/{session_id}/records/{record_id}/accept",
            post(handlers::imports::accept_record),
        )
        .route(
            "/{session_id}/records/{record_id}/reject",
            post(handlers::imports::reject_record),
        )
        .route("/{session_id}/accept-all", post(handlers::imports::accept_all))
        .route("/{session_id}/commit", post(handlers::imports::commit_session));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(handlers::dashboard::health))
        .route(
            "/api/dashboard/statistics",
            get(handlers::dashboard::all_statistics),
        )
        .nest("/api/clients", client_routes)
        .nest("/api/materials", material_routes)
        .nest("/api/visits", visit_routes)
        .nest("/api/imports", import_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
