// tests/stats_tests.rs
//
// Rentabilidade ponta a ponta: visitas + materiais no banco, incluindo o
// custo efetivo com override por cliente.

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use paisagismo_backend::{config::AppState, MIGRATOR};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("abrir sqlite em memória");
    MIGRATOR.run(&pool).await.expect("rodar migrações");
    pool
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn time(s: &str) -> chrono::NaiveTime {
    paisagismo_backend::services::row_validator::parse_time(s).unwrap()
}

#[tokio::test]
async fn custom_cost_overrides_default_in_totals() {
    let pool = test_pool().await;
    let state = AppState::with_pool(pool.clone());

    let client = state
        .catalog_service
        .create_client("Smith Residence", None, None, None, 300.0, None)
        .await
        .unwrap();
    let material = state
        .catalog_service
        .create_material("Fertilizer", 10.0, Some("bag"), true, None)
        .await
        .unwrap();

    // Preço negociado: 6 em vez de 10.
    state
        .catalog_service
        .set_client_material(client.id, material.id, Some(6.0))
        .await
        .unwrap();

    let v1 = state
        .visit_service
        .create_visit(client.id, date("2024-03-01"), time("09:00"), time("10:00"), None)
        .await
        .unwrap();
    let v2 = state
        .visit_service
        .create_visit(client.id, date("2024-03-15"), time("09:00"), time("10:00"), None)
        .await
        .unwrap();

    state.visit_service.add_material(v1.id, material.id, 2.0).await.unwrap();
    state.visit_service.add_material(v2.id, material.id, 3.0).await.unwrap();

    let stats = state.stats_service.client_statistics(client.id).await.unwrap();
    assert_eq!(stats.visit_count, 2);
    // 5 sacos × 6 (override), não × 10 (default)
    assert!((stats.total_material_cost - 30.0).abs() < 1e-9);

    // Removido o override, o total volta ao default.
    state
        .catalog_service
        .remove_client_material(client.id, material.id)
        .await
        .unwrap();
    let stats = state.stats_service.client_statistics(client.id).await.unwrap();
    assert!((stats.total_material_cost - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn single_visit_reports_insufficient_data() {
    let pool = test_pool().await;
    let state = AppState::with_pool(pool.clone());

    let client = state
        .catalog_service
        .create_client("Novo Cliente", None, None, None, 200.0, None)
        .await
        .unwrap();
    state
        .visit_service
        .create_visit(client.id, date("2024-06-10"), time("08:00"), time("09:30"), None)
        .await
        .unwrap();

    let stats = state.stats_service.client_statistics(client.id).await.unwrap();
    assert!(stats.insufficient_data);
    assert_eq!(stats.visits_per_year, None);
    assert_eq!(stats.is_profitable, None);
    // A média por visita existe mesmo sem frequência observável.
    assert_eq!(stats.avg_cost_per_visit, Some(0.0));
}

#[tokio::test]
async fn dashboard_covers_active_clients_only() {
    let pool = test_pool().await;
    let state = AppState::with_pool(pool.clone());

    let active = state
        .catalog_service
        .create_client("Ativo", None, None, None, 100.0, None)
        .await
        .unwrap();
    let inactive = state
        .catalog_service
        .create_client("Inativo", None, None, None, 100.0, None)
        .await
        .unwrap();
    state
        .catalog_service
        .set_client_active(inactive.id, false)
        .await
        .unwrap();

    let all = state.stats_service.all_statistics().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].client_id, active.id);

    // Estatística direta do inativo continua acessível.
    let stats = state.stats_service.client_statistics(inactive.id).await.unwrap();
    assert_eq!(stats.client_name, "Inativo");
}

#[tokio::test]
async fn projected_profit_uses_observed_frequency() {
    let pool = test_pool().await;
    let state = AppState::with_pool(pool.clone());

    let client = state
        .catalog_service
        .create_client("Mensal", None, None, None, 100.0, None)
        .await
        .unwrap();
    let material = state
        .catalog_service
        .create_material("Mix", 80.0, None, true, None)
        .await
        .unwrap();

    // Uma visita por mês de jan a dez, 1 unidade de material cada.
    for month in 1..=12u32 {
        let d = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        let visit = state
            .visit_service
            .create_visit(client.id, d, time("09:00"), time("10:00"), None)
            .await
            .unwrap();
        state
            .visit_service
            .add_material(visit.id, material.id, 1.0)
            .await
            .unwrap();
    }

    let stats = state.stats_service.client_statistics(client.id).await.unwrap();
    assert!(!stats.insufficient_data);

    // ~12 visitas/ano -> custo mensal ~80 -> sobra positiva com mensalidade 100
    let monthly_cost = stats.calculated_monthly_cost.unwrap();
    assert!((monthly_cost - 80.0).abs() < 10.0, "custo mensal = {monthly_cost}");
    assert_eq!(stats.is_profitable, Some(true));
}
