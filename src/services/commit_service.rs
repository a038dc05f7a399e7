// src/services/commit_service.rs
//
// Commit Engine: aplica os registros aceitos de uma sessão no banco. Cada
// registro roda na SUA transação: a falha de um não desfaz o que já foi
// commitado antes dele (progresso monotônico, relatado por registro).

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        client_repo::ClientRepository, material_repo::MaterialRepository,
        visit_repo::VisitRepository,
    },
    models::import::{
        CommitEntry, CommitOutcome, CommitReport, ImportSession, NormalizedFields, RecordStatus,
        StagedRecord,
    },
    services::row_validator::{duration_minutes, format_time},
};

#[derive(Clone)]
pub struct CommitEngine {
    pool: SqlitePool,
    client_repo: ClientRepository,
    material_repo: MaterialRepository,
    visit_repo: VisitRepository,
}

impl CommitEngine {
    pub fn new(
        pool: SqlitePool,
        client_repo: ClientRepository,
        material_repo: MaterialRepository,
        visit_repo: VisitRepository,
    ) -> Self {
        Self {
            pool,
            client_repo,
            material_repo,
            visit_repo,
        }
    }

    // `selected = None` commita os registros aceitos; com ids explícitos,
    // commita esses (na ordem de staging, nunca na ordem da lista).
    pub async fn commit(
        &self,
        session: &ImportSession,
        selected: Option<&[Uuid]>,
    ) -> Result<CommitReport, AppError> {
        let mut report = CommitReport::default();

        for record in &session.records {
            let chosen = match selected {
                Some(ids) => ids.contains(&record.id),
                None => record.status == RecordStatus::Accepted,
            };
            if !chosen {
                continue;
            }

            if record.status == RecordStatus::Rejected {
                report.push(entry(record, CommitOutcome::Skipped, None, Some("registro rejeitado".into())));
                continue;
            }
            if !record.is_clean() {
                let fields: Vec<&str> = record.problems.keys().map(String::as_str).collect();
                report.push(entry(
                    record,
                    CommitOutcome::Skipped,
                    None,
                    Some(format!("pendências não resolvidas: {}", fields.join(", "))),
                ));
                continue;
            }

            // Transação POR registro.
            match self.apply(record).await {
                Ok(applied) => report.push(applied),
                Err(e) => {
                    tracing::warn!(
                        registro = %record.id,
                        origem = %record.source.describe(),
                        erro = %e,
                        "Falha ao aplicar registro importado"
                    );
                    report.push(entry(record, CommitOutcome::Failed, None, Some(e.to_string())));
                }
            }
        }

        Ok(report)
    }

    async fn apply(&self, record: &StagedRecord) -> Result<CommitEntry, AppError> {
        let Some(normalized) = &record.normalized else {
            // is_clean() sem projeção tipada é bug do validador.
            return Err(anyhow::anyhow!("registro limpo sem projeção tipada").into());
        };

        let mut tx = self.pool.begin().await?;

        let result = match normalized {
            NormalizedFields::Client {
                name,
                email,
                phone,
                address,
                monthly_charge,
                notes,
            } => {
                // Nome já existente = atualização de contato, não duplicata.
                let existing = self
                    .client_repo
                    .find_by_normalized_name(&mut *tx, name)
                    .await?;
                match existing {
                    Some(client) => {
                        let updated = self
                            .client_repo
                            .update_contact(
                                &mut *tx,
                                client.id,
                                email.as_deref(),
                                phone.as_deref(),
                                address.as_deref(),
                                *monthly_charge,
                                notes.as_deref(),
                            )
                            .await?;
                        entry(
                            record,
                            CommitOutcome::Committed,
                            Some(updated.id),
                            Some("cliente existente atualizado".into()),
                        )
                    }
                    None => {
                        let created = self
                            .client_repo
                            .create(
                                &mut *tx,
                                name,
                                email.as_deref(),
                                phone.as_deref(),
                                address.as_deref(),
                                *monthly_charge,
                                notes.as_deref(),
                            )
                            .await?;
                        entry(record, CommitOutcome::Committed, Some(created.id), None)
                    }
                }
            }

            NormalizedFields::Material {
                name,
                cost,
                unit,
                is_global,
                description,
            } => {
                // Material duplicado não é atualizado: o custo cadastrado
                // manda, a planilha não sobrescreve.
                let existing = self
                    .material_repo
                    .find_by_normalized_name(&mut *tx, name)
                    .await?;
                match existing {
                    Some(material) => entry(
                        record,
                        CommitOutcome::Skipped,
                        Some(material.id),
                        Some(format!("material '{name}' já cadastrado")),
                    ),
                    None => {
                        let created = self
                            .material_repo
                            .create(
                                &mut *tx,
                                name,
                                *cost,
                                unit.as_deref(),
                                *is_global,
                                description.as_deref(),
                            )
                            .await?;
                        entry(record, CommitOutcome::Committed, Some(created.id), None)
                    }
                }
            }

            NormalizedFields::Visit {
                client_name,
                date,
                start_time,
                end_time,
                notes,
            } => {
                // Resolve de novo DENTRO da transação: um registro de cliente
                // commitado logo antes neste mesmo lote já é visível aqui.
                let client = self
                    .client_repo
                    .find_by_normalized_name(&mut *tx, client_name)
                    .await?;
                let client_id = match client {
                    Some(client) => client.id,
                    None if record.create_missing => {
                        let created = self
                            .client_repo
                            .create(
                                &mut *tx,
                                client_name.trim(),
                                None,
                                None,
                                None,
                                0.0,
                                Some("Criado automaticamente pela importação de visitas"),
                            )
                            .await?;
                        created.id
                    }
                    None => {
                        // Sem autorização para criar: pula, não falha.
                        tx.rollback().await?;
                        return Ok(entry(
                            record,
                            CommitOutcome::Skipped,
                            None,
                            Some(format!("cliente '{client_name}' não cadastrado")),
                        ));
                    }
                };

                let visit = self
                    .visit_repo
                    .create(
                        &mut *tx,
                        client_id,
                        *date,
                        &format_time(*start_time),
                        &format_time(*end_time),
                        duration_minutes(*start_time, *end_time),
                        notes.as_deref(),
                    )
                    .await?;
                entry(record, CommitOutcome::Committed, Some(visit.id), None)
            }
        };

        tx.commit().await?;
        Ok(result)
    }
}

fn entry(
    record: &StagedRecord,
    outcome: CommitOutcome,
    entity_id: Option<i64>,
    reason: Option<String>,
) -> CommitEntry {
    CommitEntry {
        record_id: record.id,
        kind: record.kind,
        source: record.source.describe(),
        outcome,
        entity_id,
        reason,
    }
}
