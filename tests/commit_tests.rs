// tests/commit_tests.rs
//
// Commit Engine: desfecho por registro, progresso monotônico, e as regras
// de duplicata (cliente atualiza, material pula, visita nunca deduplica).

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use paisagismo_backend::{
    db::{ClientRepository, MaterialRepository, VisitRepository},
    models::import::{
        CommitOutcome, EntityKind, ImportSession, ImportSource, NormalizedFields, RecordSource,
        RecordStatus, StagedRecord,
    },
    services::CommitEngine,
    MIGRATOR,
};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("abrir sqlite em memória");
    MIGRATOR.run(&pool).await.expect("rodar migrações");
    pool
}

fn engine(pool: &SqlitePool) -> CommitEngine {
    CommitEngine::new(
        pool.clone(),
        ClientRepository::new(pool.clone()),
        MaterialRepository::new(pool.clone()),
        VisitRepository::new(pool.clone()),
    )
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn time(s: &str) -> NaiveTime {
    paisagismo_backend::services::row_validator::parse_time(s).unwrap()
}

fn accepted(kind: EntityKind, row: usize, normalized: NormalizedFields) -> StagedRecord {
    let mut record = StagedRecord::new(
        kind,
        RecordSource::Sheet { sheet: "Teste".into(), row },
        BTreeMap::new(),
    );
    record.normalized = Some(normalized);
    record.status = RecordStatus::Accepted;
    record
}

fn client_fields(name: &str, monthly_charge: f64, phone: Option<&str>) -> NormalizedFields {
    NormalizedFields::Client {
        name: name.to_string(),
        email: None,
        phone: phone.map(str::to_string),
        address: None,
        monthly_charge,
        notes: None,
    }
}

fn visit_fields(client_name: &str, d: &str, start: &str, end: &str) -> NormalizedFields {
    NormalizedFields::Visit {
        client_name: client_name.to_string(),
        date: date(d),
        start_time: time(start),
        end_time: time(end),
        notes: None,
    }
}

fn session_of(records: Vec<StagedRecord>) -> ImportSession {
    ImportSession::new(ImportSource::Excel, records, Default::default())
}

#[tokio::test]
async fn new_client_is_created_and_match_updates_in_place() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    let session = session_of(vec![accepted(
        EntityKind::Client,
        2,
        client_fields("Smith Residence", 300.0, None),
    )]);
    let report = engine.commit(&session, None).await.unwrap();
    assert_eq!(report.committed, 1);
    let first_id = report.entries[0].entity_id.unwrap();

    // Segundo lote com o mesmo nome (caixa diferente) atualiza o cadastro.
    let session = session_of(vec![accepted(
        EntityKind::Client,
        2,
        client_fields("smith residence", 350.0, Some("555-0101")),
    )]);
    let report = engine.commit(&session, None).await.unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.entries[0].entity_id, Some(first_id));
    assert!(report.entries[0]
        .reason
        .as_deref()
        .unwrap()
        .contains("atualizado"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (charge, phone): (f64, Option<String>) =
        sqlx::query_as("SELECT monthly_charge, phone FROM clients WHERE id = ?")
            .bind(first_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(charge, 350.0);
    assert_eq!(phone.as_deref(), Some("555-0101"));
}

#[tokio::test]
async fn duplicate_material_is_skipped_not_updated() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    let mulch = |cost: f64| NormalizedFields::Material {
        name: "Mulch".to_string(),
        cost,
        unit: Some("bag".to_string()),
        is_global: true,
        description: None,
    };
    let session = session_of(vec![accepted(EntityKind::Material, 2, mulch(5.5))]);
    let report = engine.commit(&session, None).await.unwrap();
    assert_eq!(report.committed, 1);

    // Reimportar o mesmo material: pulado, custo original intacto.
    let session = session_of(vec![accepted(EntityKind::Material, 2, mulch(9.99))]);
    let report = engine.commit(&session, None).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.entries[0].outcome, CommitOutcome::Skipped);

    let cost: f64 = sqlx::query_scalar("SELECT default_cost FROM materials WHERE name = 'Mulch'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cost, 5.5);
}

#[tokio::test]
async fn visit_without_client_is_skipped_unless_create_missing() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    // Sem autorização: pulado, nada criado.
    let session = session_of(vec![accepted(
        EntityKind::Visit,
        2,
        visit_fields("Fantasma", "2024-01-15", "09:00", "10:00"),
    )]);
    let report = engine.commit(&session, None).await.unwrap();
    assert_eq!(report.skipped, 1);
    let clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(clients, 0);

    // Com create_missing: cliente criado junto com a visita, na mesma
    // transação.
    let mut record = accepted(
        EntityKind::Visit,
        2,
        visit_fields("Fantasma", "2024-01-15", "09:00", "10:00"),
    );
    record.create_missing = true;
    let report = engine.commit(&session_of(vec![record]), None).await.unwrap();
    assert_eq!(report.committed, 1);

    let (clients, visits): (i64, i64) = (
        sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&pool)
            .await
            .unwrap(),
        sqlx::query_scalar("SELECT COUNT(*) FROM visits")
            .fetch_one(&pool)
            .await
            .unwrap(),
    );
    assert_eq!((clients, visits), (1, 1));

    // Duração calculada e persistida.
    let duration: f64 = sqlx::query_scalar("SELECT duration_minutes FROM visits LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(duration, 60.0);
}

#[tokio::test]
async fn visits_are_never_deduplicated() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    ClientRepository::new(pool.clone())
        .create(&pool, "Smith Residence", None, None, None, 300.0, None)
        .await
        .unwrap();

    let make_session = || {
        session_of(vec![accepted(
            EntityKind::Visit,
            2,
            visit_fields("Smith Residence", "2024-01-15", "09:00", "10:00"),
        )])
    };

    engine.commit(&make_session(), None).await.unwrap();
    engine.commit(&make_session(), None).await.unwrap();

    let visits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visits")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(visits, 2);
}

#[tokio::test]
async fn dirty_and_rejected_records_do_not_block_the_batch() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    let good_before = accepted(EntityKind::Client, 2, client_fields("Primeiro", 100.0, None));

    let mut dirty = accepted(EntityKind::Client, 3, client_fields("Sujo", 100.0, None));
    dirty
        .problems
        .insert("monthly_charge".to_string(), "invalid_number".to_string());

    let mut rejected = accepted(EntityKind::Client, 4, client_fields("Rejeitado", 100.0, None));
    rejected.status = RecordStatus::Rejected;
    let rejected_id = rejected.id;

    let good_after = accepted(EntityKind::Client, 5, client_fields("Último", 100.0, None));

    // Seleção explícita inclui até o rejeitado, que vira Skipped.
    let session = session_of(vec![good_before, dirty, rejected, good_after]);
    let selected: Vec<_> = session.records.iter().map(|r| r.id).collect();
    let report = engine.commit(&session, Some(&selected)).await.unwrap();

    assert_eq!(report.committed, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    let rejected_entry = report
        .entries
        .iter()
        .find(|e| e.record_id == rejected_id)
        .unwrap();
    assert_eq!(rejected_entry.outcome, CommitOutcome::Skipped);

    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM clients ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names, vec!["Primeiro".to_string(), "Último".to_string()]);
}

#[tokio::test]
async fn default_selection_commits_only_accepted_records() {
    let pool = test_pool().await;
    let engine = engine(&pool);

    let accepted_rec = accepted(EntityKind::Client, 2, client_fields("Aceito", 100.0, None));
    let mut pending = accepted(EntityKind::Client, 3, client_fields("Pendente", 100.0, None));
    pending.status = RecordStatus::Pending;

    let session = session_of(vec![accepted_rec, pending]);
    let report = engine.commit(&session, None).await.unwrap();

    assert_eq!(report.committed, 1);
    assert_eq!(report.entries.len(), 1);

    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM clients")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names, vec!["Aceito".to_string()]);
}
