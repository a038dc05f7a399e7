// src/services/entity_resolver.rs
//
// Mapeia um nome em texto livre para o id de uma entidade existente, ou
// sinaliza que ela precisa ser criada. `None` NÃO é erro: é o chamador
// que decide entre criar a entidade ou pedir confirmação ao usuário.
//
// A comparação é exata após lower(trim()): nada de fuzzy, para nunca
// fundir dois clientes distintos por acidente.

use sqlx::{Executor, Sqlite};

use crate::{
    common::error::AppError,
    db::{ClientRepository, MaterialRepository},
    models::import::EntityKind,
};

#[derive(Clone)]
pub struct EntityResolver {
    client_repo: ClientRepository,
    material_repo: MaterialRepository,
}

impl EntityResolver {
    pub fn new(client_repo: ClientRepository, material_repo: MaterialRepository) -> Self {
        Self {
            client_repo,
            material_repo,
        }
    }

    // Somente leitura; nunca cria nada.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        kind: EntityKind,
        name: &str,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        match kind {
            // Registros de visita referenciam clientes pelo nome.
            EntityKind::Client | EntityKind::Visit => self.resolve_client(executor, name).await,
            EntityKind::Material => self.resolve_material(executor, name).await,
        }
    }

    pub async fn resolve_client<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let client = self.client_repo.find_by_normalized_name(executor, name).await?;
        Ok(client.map(|c| c.id))
    }

    pub async fn resolve_material<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let material = self
            .material_repo
            .find_by_normalized_name(executor, name)
            .await?;
        Ok(material.map(|m| m.id))
    }
}
