// src/db/material_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::error::AppError,
    models::catalog::{ClientMaterial, ClientMaterialDetail, Material},
};

const MATERIAL_COLUMNS: &str = "id, name, default_cost, unit, is_global, description";

#[derive(Clone)]
pub struct MaterialRepository {
    #[allow(dead_code)]
    pool: SqlitePool,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        default_cost: f64,
        unit: Option<&str>,
        is_global: bool,
        description: Option<&str>,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "INSERT INTO materials (name, default_cost, unit, is_global, description) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {MATERIAL_COLUMNS}"
        );
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(name)
            .bind(default_cost)
            .bind(unit)
            .bind(is_global)
            .bind(description)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                // Tratamento de erro de chave duplicada (name UNIQUE)
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "O material '{}' já existe.",
                            name
                        ));
                    }
                }
                e.into()
            })?;

        Ok(material)
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?");
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(material)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Material>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY name");
        let materials = sqlx::query_as::<_, Material>(&sql)
            .fetch_all(executor)
            .await?;

        Ok(materials)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i64,
        name: &str,
        default_cost: f64,
        unit: Option<&str>,
        is_global: bool,
        description: Option<&str>,
    ) -> Result<Material, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE materials \
             SET name = ?, default_cost = ?, unit = ?, is_global = ?, description = ? \
             WHERE id = ? \
             RETURNING {MATERIAL_COLUMNS}"
        );
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(name)
            .bind(default_cost)
            .bind(unit)
            .bind(is_global)
            .bind(description)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::MaterialNotFound)?;

        Ok(material)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MaterialNotFound);
        }
        Ok(())
    }

    pub async fn find_by_normalized_name<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Material>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials \
             WHERE lower(trim(name)) = lower(trim(?)) LIMIT 1"
        );
        let material = sqlx::query_as::<_, Material>(&sql)
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(material)
    }

    // =========================================================================
    //  PREÇOS POR CLIENTE
    // =========================================================================

    // Upsert: garante a invariante de no máximo uma linha por par
    // (cliente, material).
    pub async fn upsert_client_material<'e, E>(
        &self,
        executor: E,
        client_id: i64,
        material_id: i64,
        custom_cost: Option<f64>,
    ) -> Result<ClientMaterial, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, ClientMaterial>(
            "INSERT INTO client_materials (client_id, material_id, custom_cost) \
             VALUES (?, ?, ?) \
             ON CONFLICT (client_id, material_id) \
             DO UPDATE SET custom_cost = excluded.custom_cost \
             RETURNING id, client_id, material_id, custom_cost",
        )
        .bind(client_id)
        .bind(material_id)
        .bind(custom_cost)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn list_client_materials<'e, E>(
        &self,
        executor: E,
        client_id: i64,
    ) -> Result<Vec<ClientMaterialDetail>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, ClientMaterialDetail>(
            "SELECT \
                m.id as material_id, m.name, m.default_cost, m.unit, \
                cm.custom_cost, \
                COALESCE(cm.custom_cost, m.default_cost) as effective_cost \
             FROM client_materials cm \
             JOIN materials m ON cm.material_id = m.id \
             WHERE cm.client_id = ? \
             ORDER BY m.name",
        )
        .bind(client_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn remove_client_material<'e, E>(
        &self,
        executor: E,
        client_id: i64,
        material_id: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result =
            sqlx::query("DELETE FROM client_materials WHERE client_id = ? AND material_id = ?")
                .bind(client_id)
                .bind(material_id)
                .execute(executor)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MaterialNotFound);
        }
        Ok(())
    }
}
