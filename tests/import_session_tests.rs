// tests/import_session_tests.rs
//
// Pipeline de importação por OCR com backend de visão mockado, mais as
// operações da sessão de verificação (edição, aceite, rejeição).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use paisagismo_backend::{
    common::error::AppError,
    db::{ClientRepository, MaterialRepository, VisitRepository},
    models::import::{
        EntityKind, ImagePayload, ImportSession, ImportSource, RecordSource, RecordStatus,
        StagedRecord,
    },
    services::{
        CommitEngine, EntityResolver, ExcelImportService, ImportService, OcrImportService,
        RowValidator, SessionStore, VisionBackend,
    },
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

// Backend de visão falso: devolve texto fixo por nome de imagem, e falha
// nas imagens cujo nome começa com "bad".
struct FakeVision;

#[async_trait]
impl VisionBackend for FakeVision {
    fn is_available(&self) -> bool {
        true
    }

    async fn extract_text(&self, image: &ImagePayload) -> Result<String, AppError> {
        if image.name.starts_with("bad") {
            return Err(AppError::VisionBackend(format!(
                "imagem '{}' ilegível",
                image.name
            )));
        }
        Ok(format!(
            "Date: 01/15/2024 | Client: {} | Time: 09:30-11:45",
            image.name.trim_end_matches(".jpg")
        ))
    }
}

fn import_service(pool: &SqlitePool, store: SessionStore) -> ImportService {
    let client_repo = ClientRepository::new(pool.clone());
    let material_repo = MaterialRepository::new(pool.clone());
    let visit_repo = VisitRepository::new(pool.clone());

    let resolver = EntityResolver::new(client_repo.clone(), material_repo.clone());
    let commit_engine = CommitEngine::new(
        pool.clone(),
        client_repo,
        material_repo,
        visit_repo,
    );

    ImportService::new(
        pool.clone(),
        ExcelImportService::new(),
        OcrImportService::new(Arc::new(FakeVision), 2),
        RowValidator::new(resolver),
        commit_engine,
        store,
    )
}

fn image(name: &str) -> ImagePayload {
    ImagePayload {
        name: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        data: "aGVsbG8=".to_string(),
    }
}

#[tokio::test]
async fn one_failed_image_does_not_abort_the_batch() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    let images = vec![
        image("Smith Residence.jpg"),
        image("Jones Commercial.jpg"),
        image("bad-scan.jpg"),
        image("Green Valley.jpg"),
        image("Hilltop.jpg"),
    ];
    let session = service.import_ocr(images).await.unwrap();

    // 4 registros (a imagem ruim rende zero), na ordem de envio.
    assert_eq!(session.records.len(), 4);
    let clients: Vec<&str> = session
        .records
        .iter()
        .map(|r| r.raw.get("client_name").unwrap().as_str())
        .collect();
    assert_eq!(
        clients,
        vec!["Smith Residence", "Jones Commercial", "Green Valley", "Hilltop"]
    );

    // A falha fica registrada como diagnóstico, não como erro.
    assert_eq!(session.summary.diagnostics.len(), 1);
    assert!(session.summary.diagnostics[0].contains("bad-scan.jpg"));

    // OCR é sempre needs_review.
    assert!(session.records.iter().all(|r| r.needs_review));
}

#[tokio::test]
async fn unresolved_client_is_a_field_problem() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    let session = service.import_ocr(vec![image("Desconhecido.jpg")]).await.unwrap();
    let record = &session.records[0];

    assert_eq!(
        record.problems.get("client_name").map(String::as_str),
        Some("client_not_found")
    );
    assert!(!record.is_clean());
}

#[tokio::test]
async fn edit_revalidates_only_that_record() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    // Cliente existe, então o registro nasce limpo (mas needs_review).
    ClientRepository::new(pool.clone())
        .create(&pool, "Smith Residence", None, None, None, 300.0, None)
        .await
        .unwrap();

    let session = service.import_ocr(vec![image("Smith Residence.jpg")]).await.unwrap();
    let record_id = session.records[0].id;
    assert!(session.records[0].is_clean());

    // Estraga a data; o registro fica sujo.
    let mut updates = BTreeMap::new();
    updates.insert("date".to_string(), "ontem".to_string());
    let record = service
        .edit_record(session.id, record_id, updates, None)
        .await
        .unwrap();
    assert_eq!(record.problems.get("date").map(String::as_str), Some("invalid_date"));

    // Conserta; volta a ficar limpo e Pending.
    let mut updates = BTreeMap::new();
    updates.insert("date".to_string(), "2024-01-20".to_string());
    let record = service
        .edit_record(session.id, record_id, updates, None)
        .await
        .unwrap();
    assert!(record.is_clean());
    assert_eq!(record.status, RecordStatus::Pending);
}

#[tokio::test]
async fn accept_all_skips_needs_review_and_dirty_records() {
    let pool = test_pool().await;
    let store = SessionStore::new();
    let service = import_service(&pool, store.clone());

    ClientRepository::new(pool.clone())
        .create(&pool, "Smith Residence", None, None, None, 300.0, None)
        .await
        .unwrap();

    // Sessão OCR: registro limpo porém needs_review.
    let ocr_session = service.import_ocr(vec![image("Smith Residence.jpg")]).await.unwrap();
    let after = service.accept_all(ocr_session.id).await.unwrap();
    assert!(after
        .records
        .iter()
        .all(|r| r.status == RecordStatus::Pending));

    // Sessão artificial estilo planilha: um limpo, um sujo.
    let clean = StagedRecord::new(
        EntityKind::Client,
        RecordSource::Sheet { sheet: "Clients".into(), row: 2 },
        BTreeMap::from([
            ("name".to_string(), "Novo Cliente".to_string()),
            ("monthly_charge".to_string(), "150".to_string()),
        ]),
    );
    let mut dirty = StagedRecord::new(
        EntityKind::Client,
        RecordSource::Sheet { sheet: "Clients".into(), row: 3 },
        BTreeMap::from([("monthly_charge".to_string(), "150".to_string())]),
    );
    dirty.problems.insert("name".to_string(), "required".to_string());

    let session = ImportSession::new(ImportSource::Excel, vec![clean, dirty], Default::default());
    let session_id = session.id;
    store.insert(session).await;

    let after = service.accept_all(session_id).await.unwrap();
    assert_eq!(after.records[0].status, RecordStatus::Accepted);
    assert_eq!(after.records[1].status, RecordStatus::Pending);
}

#[tokio::test]
async fn force_accept_clears_offending_fields() {
    let pool = test_pool().await;
    let store = SessionStore::new();
    let service = import_service(&pool, store.clone());

    // Cliente com mensalidade negativa: problema em monthly_charge.
    let record = StagedRecord::new(
        EntityKind::Client,
        RecordSource::Sheet { sheet: "Clients".into(), row: 2 },
        BTreeMap::from([
            ("name".to_string(), "Cliente Teimoso".to_string()),
            ("monthly_charge".to_string(), "-50".to_string()),
        ]),
    );
    let record_id = record.id;
    let mut session = ImportSession::new(ImportSource::Excel, vec![record], Default::default());
    // Simula o estado pós-anotação.
    session.records[0]
        .problems
        .insert("monthly_charge".to_string(), "negative_value".to_string());
    let session_id = session.id;
    store.insert(session).await;

    // Sem force: bloqueado.
    let err = service.accept_record(session_id, record_id, false).await.unwrap_err();
    assert!(matches!(err, AppError::RecordNeedsReview));

    // Com force: o campo problemático é limpo e o registro re-validado
    // (mensalidade em branco vale 0).
    let accepted = service.accept_record(session_id, record_id, true).await.unwrap();
    assert_eq!(accepted.status, RecordStatus::Accepted);
    assert!(accepted.is_clean());
    assert!(!accepted.raw.contains_key("monthly_charge"));
}

#[tokio::test]
async fn reject_and_discard_leave_the_store_untouched() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    let session = service.import_ocr(vec![image("Alguém.jpg")]).await.unwrap();
    let record_id = session.records[0].id;

    let rejected = service.reject_record(session.id, record_id).await.unwrap();
    assert_eq!(rejected.status, RecordStatus::Rejected);

    service.discard(session.id).await.unwrap();
    let err = service.get_session(session.id).await.unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound));

    // Nada foi parar no banco.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visits")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn malformed_workbook_aborts_with_format_error() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    let err = service.import_excel(b"definitivamente nao e um xlsx").await.unwrap_err();
    assert!(matches!(err, AppError::FormatError(_)));
}

#[tokio::test]
async fn workbook_without_required_sheet_names_the_missing_one() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    // Pasta de trabalho válida, mas só com as abas Clients e Materials.
    let bytes = include_bytes!("fixtures/planilha_sem_visitas.xlsx");
    let err = service.import_excel(bytes).await.unwrap_err();

    match err {
        AppError::FormatError(msg) => assert!(msg.contains("Visits"), "mensagem: {msg}"),
        other => panic!("esperava FormatError, veio {other:?}"),
    }

    // Aborta antes de qualquer staging: as linhas válidas das outras abas
    // não chegam ao banco nem por um commit posterior.
    let clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(clients, 0);
}

#[tokio::test]
async fn commit_ends_the_session() {
    let pool = test_pool().await;
    let service = import_service(&pool, SessionStore::new());

    let session = service.import_ocr(vec![image("Alguém.jpg")]).await.unwrap();
    service.commit(session.id, None).await.unwrap();

    // A sessão não existe mais: repetir o commit é 404, não re-aplicação.
    let err = service.commit(session.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound));
}
