// src/services/import_service.rs
//
// Orquestra a pipeline: adaptador -> anotação (validador + resolver) ->
// sessão de verificação -> Commit Engine. A sessão é um objeto explícito,
// passado por id: nada de estado global de "importação atual".

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::import::{
        CommitReport, ImagePayload, ImportSession, ImportSource, RecordSource, RecordStatus,
        StagedRecord,
    },
    services::{
        commit_service::CommitEngine, excel_service::ExcelImportService,
        row_validator::RowValidator, session_service::SessionStore,
        vision_service::OcrImportService,
    },
};

#[derive(Clone)]
pub struct ImportService {
    pool: SqlitePool,
    excel: ExcelImportService,
    ocr: OcrImportService,
    validator: RowValidator,
    commit_engine: CommitEngine,
    sessions: SessionStore,
}

impl ImportService {
    pub fn new(
        pool: SqlitePool,
        excel: ExcelImportService,
        ocr: OcrImportService,
        validator: RowValidator,
        commit_engine: CommitEngine,
        sessions: SessionStore,
    ) -> Self {
        Self {
            pool,
            excel,
            ocr,
            validator,
            commit_engine,
            sessions,
        }
    }

    // =========================================================================
    //  ENTRADA: ADAPTADORES
    // =========================================================================

    pub async fn import_excel(&self, bytes: &[u8]) -> Result<ImportSession, AppError> {
        let (mut records, summary) = self.excel.import_workbook(bytes)?;

        for record in &mut records {
            self.annotate(record).await?;
        }

        let mut session = ImportSession::new(ImportSource::Excel, records, summary);
        refresh_summary(&mut session);

        tracing::info!(sessao = %session.id, registros = session.records.len(), "Sessão de importação Excel criada");

        self.sessions.insert(session.clone()).await;
        Ok(session)
    }

    pub async fn import_ocr(&self, images: Vec<ImagePayload>) -> Result<ImportSession, AppError> {
        let (mut records, summary) = self.ocr.import_images(images).await?;

        for record in &mut records {
            self.annotate(record).await?;
        }

        let mut session = ImportSession::new(ImportSource::Ocr, records, summary);
        refresh_summary(&mut session);

        tracing::info!(sessao = %session.id, registros = session.records.len(), "Sessão de importação OCR criada");

        self.sessions.insert(session.clone()).await;
        Ok(session)
    }

    // =========================================================================
    //  SESSÃO DE VERIFICAÇÃO
    // =========================================================================

    pub async fn get_session(&self, session_id: Uuid) -> Result<ImportSession, AppError> {
        self.sessions.get(session_id).await
    }

    // Edita UM registro e re-valida só ele (nada de re-escanear a sessão).
    // Valor vazio remove o campo do registro.
    pub async fn edit_record(
        &self,
        session_id: Uuid,
        record_id: Uuid,
        updates: BTreeMap<String, String>,
        create_missing: Option<bool>,
    ) -> Result<StagedRecord, AppError> {
        let mut guard = self.sessions.lock().lock().await;
        let session = guard.get_mut(&session_id).ok_or(AppError::SessionNotFound)?;
        let record = session.record_mut(record_id).ok_or(AppError::RecordNotFound)?;

        for (field, value) in updates {
            let value = value.trim().to_string();
            if value.is_empty() {
                record.raw.remove(&field);
            } else {
                record.raw.insert(field, value);
            }
        }
        if let Some(flag) = create_missing {
            record.create_missing = flag;
        }

        // Toda edição exige nova verificação.
        record.status = RecordStatus::Pending;

        let annotation = self
            .validator
            .validate(&self.pool, record.kind, &record.raw, record.create_missing)
            .await?;
        record.normalized = annotation.normalized;
        record.problems = annotation.problems;
        record.resolution = annotation.resolution;
        record.needs_review = needs_review(record);

        let updated = record.clone();
        refresh_summary(session);
        Ok(updated)
    }

    // Aceita um registro limpo. Com `force`, os campos problemáticos são
    // limpos (voltando aos defaults) e o registro re-validado; se ainda
    // restar pendência, continua bloqueado.
    pub async fn accept_record(
        &self,
        session_id: Uuid,
        record_id: Uuid,
        force: bool,
    ) -> Result<StagedRecord, AppError> {
        let mut guard = self.sessions.lock().lock().await;
        let session = guard.get_mut(&session_id).ok_or(AppError::SessionNotFound)?;
        let record = session.record_mut(record_id).ok_or(AppError::RecordNotFound)?;

        if !record.is_clean() {
            if !force {
                return Err(AppError::RecordNeedsReview);
            }

            let offending: Vec<String> = record.problems.keys().cloned().collect();
            for field in offending {
                record.raw.remove(&field);
            }

            let annotation = self
                .validator
                .validate(&self.pool, record.kind, &record.raw, record.create_missing)
                .await?;
            record.normalized = annotation.normalized;
            record.problems = annotation.problems;
            record.resolution = annotation.resolution;

            if !record.is_clean() {
                return Err(AppError::RecordNeedsReview);
            }
        }

        record.status = RecordStatus::Accepted;
        record.needs_review = false;

        let updated = record.clone();
        refresh_summary(session);
        Ok(updated)
    }

    pub async fn reject_record(
        &self,
        session_id: Uuid,
        record_id: Uuid,
    ) -> Result<StagedRecord, AppError> {
        let mut guard = self.sessions.lock().lock().await;
        let session = guard.get_mut(&session_id).ok_or(AppError::SessionNotFound)?;
        let record = session.record_mut(record_id).ok_or(AppError::RecordNotFound)?;

        record.status = RecordStatus::Rejected;

        let updated = record.clone();
        refresh_summary(session);
        Ok(updated)
    }

    // Aceita todo registro sem pendências, e que não esteja marcado como
    // needs_review (OCR exige ação explícita do usuário, sempre).
    pub async fn accept_all(&self, session_id: Uuid) -> Result<ImportSession, AppError> {
        let mut guard = self.sessions.lock().lock().await;
        let session = guard.get_mut(&session_id).ok_or(AppError::SessionNotFound)?;

        for record in &mut session.records {
            if record.status == RecordStatus::Pending && record.is_clean() && !record.needs_review {
                record.status = RecordStatus::Accepted;
            }
        }

        refresh_summary(session);
        Ok(session.clone())
    }

    // Descartar a sessão não tem NENHUM efeito no banco.
    pub async fn discard(&self, session_id: Uuid) -> Result<(), AppError> {
        self.sessions.remove(session_id).await?;
        Ok(())
    }

    // =========================================================================
    //  COMMIT
    // =========================================================================

    // Aplica os registros selecionados (default: os aceitos) e encerra a
    // sessão. O relatório traz o desfecho de cada registro.
    pub async fn commit(
        &self,
        session_id: Uuid,
        selected: Option<Vec<Uuid>>,
    ) -> Result<CommitReport, AppError> {
        let session = self.sessions.get(session_id).await?;

        let report = self
            .commit_engine
            .commit(&session, selected.as_deref())
            .await?;

        // Sessão termina no commit, com sucesso parcial ou não.
        self.sessions.remove(session_id).await?;

        tracing::info!(
            sessao = %session_id,
            commitados = report.committed,
            pulados = report.skipped,
            falhas = report.failed,
            "Commit de importação concluído"
        );

        Ok(report)
    }

    async fn annotate(&self, record: &mut StagedRecord) -> Result<(), AppError> {
        let annotation = self
            .validator
            .validate(&self.pool, record.kind, &record.raw, record.create_missing)
            .await?;
        record.normalized = annotation.normalized;
        record.problems = annotation.problems;
        record.resolution = annotation.resolution;
        record.needs_review = needs_review(record);
        Ok(())
    }
}

// OCR é sempre needs_review; planilha só quando há pendências.
fn needs_review(record: &StagedRecord) -> bool {
    matches!(record.source, RecordSource::Image { .. }) || !record.is_clean()
}

fn refresh_summary(session: &mut ImportSession) {
    session.summary.clean = session.records.iter().filter(|r| r.is_clean()).count();
    session.summary.needs_review = session
        .records
        .iter()
        .filter(|r| r.needs_review && r.status == RecordStatus::Pending)
        .count();
}
