// src/db/visit_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::error::AppError,
    models::visit::{Visit, VisitMaterial, VisitMaterialDetail},
};

const VISIT_COLUMNS: &str =
    "id, client_id, visit_date, start_time, end_time, duration_minutes, notes, created_at";

#[derive(Clone)]
pub struct VisitRepository {
    #[allow(dead_code)]
    pool: SqlitePool,
}

impl VisitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        client_id: i64,
        visit_date: NaiveDate,
        start_time: &str,
        end_time: &str,
        duration_minutes: f64,
        notes: Option<&str>,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "INSERT INTO visits (client_id, visit_date, start_time, end_time, duration_minutes, notes) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {VISIT_COLUMNS}"
        );
        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(client_id)
            .bind(visit_date)
            .bind(start_time)
            .bind(end_time)
            .bind(duration_minutes)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(visit)
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = ?");
        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(visit)
    }

    pub async fn list_for_client<'e, E>(
        &self,
        executor: E,
        client_id: i64,
    ) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {VISIT_COLUMNS} FROM visits \
             WHERE client_id = ? \
             ORDER BY visit_date DESC, start_time DESC"
        );
        let visits = sqlx::query_as::<_, Visit>(&sql)
            .bind(client_id)
            .fetch_all(executor)
            .await?;

        Ok(visits)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i64,
        visit_date: NaiveDate,
        start_time: &str,
        end_time: &str,
        duration_minutes: f64,
        notes: Option<&str>,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE visits \
             SET visit_date = ?, start_time = ?, end_time = ?, duration_minutes = ?, notes = ? \
             WHERE id = ? \
             RETURNING {VISIT_COLUMNS}"
        );
        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(visit_date)
            .bind(start_time)
            .bind(end_time)
            .bind(duration_minutes)
            .bind(notes)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::VisitNotFound)?;

        Ok(visit)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM visits WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VisitNotFound);
        }
        Ok(())
    }

    // =========================================================================
    //  MATERIAIS CONSUMIDOS NA VISITA
    // =========================================================================

    pub async fn add_material<'e, E>(
        &self,
        executor: E,
        visit_id: i64,
        material_id: i64,
        quantity: f64,
    ) -> Result<VisitMaterial, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, VisitMaterial>(
            "INSERT INTO visit_materials (visit_id, material_id, quantity) \
             VALUES (?, ?, ?) \
             RETURNING id, visit_id, material_id, quantity",
        )
        .bind(visit_id)
        .bind(material_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    // Custo efetivo resolvido AGORA: COALESCE(preço do cliente, default).
    // Repricing de material muda o histórico de propósito (ver DESIGN.md).
    pub async fn list_materials<'e, E>(
        &self,
        executor: E,
        visit_id: i64,
    ) -> Result<Vec<VisitMaterialDetail>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, VisitMaterialDetail>(
            "SELECT \
                vm.id, vm.visit_id, vm.material_id, m.name, m.unit, vm.quantity, \
                COALESCE(cm.custom_cost, m.default_cost) as effective_cost \
             FROM visit_materials vm \
             JOIN visits v ON vm.visit_id = v.id \
             JOIN materials m ON vm.material_id = m.id \
             LEFT JOIN client_materials cm \
                ON cm.client_id = v.client_id AND cm.material_id = vm.material_id \
             WHERE vm.visit_id = ?",
        )
        .bind(visit_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn remove_material<'e, E>(
        &self,
        executor: E,
        visit_material_id: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM visit_materials WHERE id = ?")
            .bind(visit_material_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::VisitNotFound);
        }
        Ok(())
    }
}
