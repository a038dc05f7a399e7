// src/services/visit_service.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{ClientRepository, MaterialRepository, VisitRepository},
    models::visit::{Visit, VisitMaterial, VisitMaterialDetail},
    services::row_validator::{duration_minutes, format_time},
};

#[derive(Clone)]
pub struct VisitService {
    pool: SqlitePool,
    visit_repo: VisitRepository,
    client_repo: ClientRepository,
    material_repo: MaterialRepository,
}

impl VisitService {
    pub fn new(
        pool: SqlitePool,
        visit_repo: VisitRepository,
        client_repo: ClientRepository,
        material_repo: MaterialRepository,
    ) -> Self {
        Self {
            pool,
            visit_repo,
            client_repo,
            material_repo,
        }
    }

    pub async fn create_visit(
        &self,
        client_id: i64,
        visit_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        notes: Option<&str>,
    ) -> Result<Visit, AppError> {
        check_interval(start_time, end_time)?;

        self.client_repo
            .get(&self.pool, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        self.visit_repo
            .create(
                &self.pool,
                client_id,
                visit_date,
                &format_time(start_time),
                &format_time(end_time),
                duration_minutes(start_time, end_time),
                notes,
            )
            .await
    }

    pub async fn get_visit(&self, id: i64) -> Result<Visit, AppError> {
        self.visit_repo
            .get(&self.pool, id)
            .await?
            .ok_or(AppError::VisitNotFound)
    }

    pub async fn list_for_client(&self, client_id: i64) -> Result<Vec<Visit>, AppError> {
        self.client_repo
            .get(&self.pool, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        self.visit_repo.list_for_client(&self.pool, client_id).await
    }

    pub async fn update_visit(
        &self,
        id: i64,
        visit_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        notes: Option<&str>,
    ) -> Result<Visit, AppError> {
        check_interval(start_time, end_time)?;

        self.visit_repo
            .update(
                &self.pool,
                id,
                visit_date,
                &format_time(start_time),
                &format_time(end_time),
                duration_minutes(start_time, end_time),
                notes,
            )
            .await
    }

    pub async fn delete_visit(&self, id: i64) -> Result<(), AppError> {
        self.visit_repo.delete(&self.pool, id).await
    }

    // --- MATERIAIS DA VISITA ---

    pub async fn add_material(
        &self,
        visit_id: i64,
        material_id: i64,
        quantity: f64,
    ) -> Result<VisitMaterial, AppError> {
        self.get_visit(visit_id).await?;
        self.material_repo
            .get(&self.pool, material_id)
            .await?
            .ok_or(AppError::MaterialNotFound)?;

        self.visit_repo
            .add_material(&self.pool, visit_id, material_id, quantity)
            .await
    }

    pub async fn list_materials(&self, visit_id: i64) -> Result<Vec<VisitMaterialDetail>, AppError> {
        self.get_visit(visit_id).await?;
        self.visit_repo.list_materials(&self.pool, visit_id).await
    }

    pub async fn remove_material(&self, visit_material_id: i64) -> Result<(), AppError> {
        self.visit_repo.remove_material(&self.pool, visit_material_id).await
    }
}

// Visita de duração zero é válida (registro pontual); fim antes do início
// não é.
fn check_interval(start: NaiveTime, end: NaiveTime) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::FormatError(
            "O horário de término não pode ser anterior ao de início.".into(),
        ));
    }
    Ok(())
}
