// src/db/stats_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::common::error::AppError;

// Agregados crus por cliente. O cálculo de rentabilidade em si é função
// pura no StatsService; aqui só buscamos números.
#[derive(Clone)]
pub struct StatsRepository {
    #[allow(dead_code)]
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn visit_count<'e, E>(&self, executor: E, client_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visits WHERE client_id = ?")
            .bind(client_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    // Soma de quantidade × custo efetivo sobre todas as visitas do cliente.
    // O custo efetivo é o ATUAL (override se houver, senão default).
    pub async fn total_material_cost<'e, E>(
        &self,
        executor: E,
        client_id: i64,
    ) -> Result<f64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(vm.quantity * COALESCE(cm.custom_cost, m.default_cost)), 0.0) \
             FROM visits v \
             JOIN visit_materials vm ON vm.visit_id = v.id \
             JOIN materials m ON m.id = vm.material_id \
             LEFT JOIN client_materials cm \
                ON cm.client_id = v.client_id AND cm.material_id = vm.material_id \
             WHERE v.client_id = ?",
        )
        .bind(client_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }

    // Primeira e última visita, para estimar a frequência observada.
    pub async fn visit_date_range<'e, E>(
        &self,
        executor: E,
        client_id: i64,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (Option<NaiveDate>, Option<NaiveDate>) = sqlx::query_as(
            "SELECT MIN(visit_date), MAX(visit_date) FROM visits WHERE client_id = ?",
        )
        .bind(client_id)
        .fetch_one(executor)
        .await?;

        match row {
            (Some(first), Some(last)) => Ok(Some((first, last))),
            _ => Ok(None),
        }
    }
}
