// src/services/catalog_service.rs
//
// Regras de negócio do catálogo: clientes, materiais e preços por cliente.
// Os handlers não falam com os repositórios diretamente.

use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{ClientRepository, MaterialRepository},
    models::catalog::{Client, ClientMaterial, ClientMaterialDetail, Material},
};

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
    client_repo: ClientRepository,
    material_repo: MaterialRepository,
}

impl CatalogService {
    pub fn new(
        pool: SqlitePool,
        client_repo: ClientRepository,
        material_repo: MaterialRepository,
    ) -> Self {
        Self {
            pool,
            client_repo,
            material_repo,
        }
    }

    // --- CLIENTES ---

    pub async fn create_client(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        monthly_charge: f64,
        notes: Option<&str>,
    ) -> Result<Client, AppError> {
        self.ensure_name_free(name, None).await?;

        let client = self
            .client_repo
            .create(&self.pool, name, email, phone, address, monthly_charge, notes)
            .await?;

        tracing::info!(cliente = %client.name, id = client.id, "Cliente criado");
        Ok(client)
    }

    pub async fn get_client(&self, id: i64) -> Result<Client, AppError> {
        self.client_repo
            .get(&self.pool, id)
            .await?
            .ok_or(AppError::ClientNotFound)
    }

    pub async fn list_clients(&self, active_only: bool) -> Result<Vec<Client>, AppError> {
        self.client_repo.list(&self.pool, active_only).await
    }

    pub async fn update_client(
        &self,
        id: i64,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
        monthly_charge: f64,
        notes: Option<&str>,
    ) -> Result<Client, AppError> {
        self.ensure_name_free(name, Some(id)).await?;

        self.client_repo
            .update(&self.pool, id, name, email, phone, address, monthly_charge, notes)
            .await
    }

    // O nome do cliente é único entre os ATIVOS. Um homônimo desativado não
    // bloqueia: o cadastro novo convive com o histórico antigo.
    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i64>) -> Result<(), AppError> {
        let existing = self
            .client_repo
            .find_active_by_normalized_name(&self.pool, name)
            .await?;

        if let Some(client) = existing {
            if exclude_id != Some(client.id) {
                return Err(AppError::UniqueConstraintViolation(format!(
                    "Já existe um cliente ativo com o nome '{}'.",
                    name.trim()
                )));
            }
        }
        Ok(())
    }

    // Desativar preserva o histórico; o cliente some das análises.
    pub async fn set_client_active(&self, id: i64, active: bool) -> Result<Client, AppError> {
        self.client_repo.set_active(&self.pool, id, active).await?;
        self.get_client(id).await
    }

    // Hard delete: cascata apaga visitas e preços específicos.
    pub async fn delete_client(&self, id: i64) -> Result<(), AppError> {
        self.client_repo.delete(&self.pool, id).await?;
        tracing::info!(id, "Cliente removido (com histórico)");
        Ok(())
    }

    // --- MATERIAIS ---

    pub async fn create_material(
        &self,
        name: &str,
        default_cost: f64,
        unit: Option<&str>,
        is_global: bool,
        description: Option<&str>,
    ) -> Result<Material, AppError> {
        self.material_repo
            .create(&self.pool, name, default_cost, unit, is_global, description)
            .await
    }

    pub async fn get_material(&self, id: i64) -> Result<Material, AppError> {
        self.material_repo
            .get(&self.pool, id)
            .await?
            .ok_or(AppError::MaterialNotFound)
    }

    pub async fn list_materials(&self) -> Result<Vec<Material>, AppError> {
        self.material_repo.list(&self.pool).await
    }

    pub async fn update_material(
        &self,
        id: i64,
        name: &str,
        default_cost: f64,
        unit: Option<&str>,
        is_global: bool,
        description: Option<&str>,
    ) -> Result<Material, AppError> {
        self.material_repo
            .update(&self.pool, id, name, default_cost, unit, is_global, description)
            .await
    }

    pub async fn delete_material(&self, id: i64) -> Result<(), AppError> {
        self.material_repo.delete(&self.pool, id).await
    }

    // --- PREÇOS POR CLIENTE ---

    // `custom_cost = None` associa o material ao cliente mantendo o custo
    // default. O upsert garante uma linha por par.
    pub async fn set_client_material(
        &self,
        client_id: i64,
        material_id: i64,
        custom_cost: Option<f64>,
    ) -> Result<ClientMaterial, AppError> {
        // Valida as pontas antes do upsert, para 404 coerente.
        self.get_client(client_id).await?;
        self.get_material(material_id).await?;

        self.material_repo
            .upsert_client_material(&self.pool, client_id, material_id, custom_cost)
            .await
    }

    pub async fn list_client_materials(
        &self,
        client_id: i64,
    ) -> Result<Vec<ClientMaterialDetail>, AppError> {
        self.get_client(client_id).await?;
        self.material_repo
            .list_client_materials(&self.pool, client_id)
            .await
    }

    pub async fn remove_client_material(
        &self,
        client_id: i64,
        material_id: i64,
    ) -> Result<(), AppError> {
        self.material_repo
            .remove_client_material(&self.pool, client_id, material_id)
            .await
    }
}
