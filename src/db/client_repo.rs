// src/db/client_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{common::error::AppError, models::catalog::Client};

const CLIENT_COLUMNS: &str =
    "id, name, email, phone, address, monthly_charge, is_active, notes, created_at";

#[derive(Clone)]
pub struct ClientRepository {
    #[allow(dead_code)]
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        monthly_charge: f64,
        notes: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "INSERT INTO clients (name, email, phone, address, monthly_charge, notes) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {CLIENT_COLUMNS}"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(address)
            .bind(monthly_charge)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(client)
    }

    pub async fn get<'e, E>(&self, executor: E, id: i64) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?");
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(client)
    }

    pub async fn list<'e, E>(&self, executor: E, active_only: bool) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = if active_only {
            format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE is_active = 1 ORDER BY name")
        } else {
            format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name")
        };
        let clients = sqlx::query_as::<_, Client>(&sql).fetch_all(executor).await?;

        Ok(clients)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i64,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        monthly_charge: f64,
        notes: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE clients \
             SET name = ?, email = ?, phone = ?, address = ?, monthly_charge = ?, notes = ? \
             WHERE id = ? \
             RETURNING {CLIENT_COLUMNS}"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(name)
            .bind(email)
            .bind(phone)
            .bind(address)
            .bind(monthly_charge)
            .bind(notes)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        Ok(client)
    }

    // Atualização parcial usada pelo Commit Engine: só sobrescreve os campos
    // de contato que vieram preenchidos na importação.
    pub async fn update_contact<'e, E>(
        &self,
        executor: E,
        id: i64,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        monthly_charge: f64,
        notes: Option<&str>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "UPDATE clients \
             SET email = COALESCE(?, email), \
                 phone = COALESCE(?, phone), \
                 address = COALESCE(?, address), \
                 monthly_charge = ?, \
                 notes = COALESCE(?, notes) \
             WHERE id = ? \
             RETURNING {CLIENT_COLUMNS}"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(email)
            .bind(phone)
            .bind(address)
            .bind(monthly_charge)
            .bind(notes)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        Ok(client)
    }

    // Soft delete: o cliente some das análises mas o histórico fica.
    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        id: i64,
        active: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE clients SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ClientNotFound);
        }
        Ok(())
    }

    // Hard delete: remove o cliente e, via FK ON DELETE CASCADE, as visitas
    // e os preços específicos. Irreversível.
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ClientNotFound);
        }
        Ok(())
    }

    // Busca por nome normalizado, para o Entity Resolver. Igualdade exata
    // depois de lower(trim()): sem fuzzy, para não fundir clientes
    // distintos silenciosamente.
    pub async fn find_by_normalized_name<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE lower(trim(name)) = lower(trim(?)) LIMIT 1"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(client)
    }

    // Mesma busca, restrita aos ativos. O nome só precisa ser único entre
    // clientes ativos, então é esta que o CRUD consulta antes de gravar.
    pub async fn find_active_by_normalized_name<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients \
             WHERE lower(trim(name)) = lower(trim(?)) AND is_active = 1 LIMIT 1"
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(client)
    }
}
