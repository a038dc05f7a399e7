// src/services/session_service.rs
//
// Guarda as sessões de importação em memória. Sessão é estado transitório:
// descartar uma sessão não toca o banco, e nada daqui sobrevive a um
// restart.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{common::error::AppError, models::import::ImportSession};

#[derive(Clone, Default)]
pub struct SessionStore {
    // Mutex do tokio: as operações de sessão re-validam registros com
    // acesso ao banco segurando o lock (uso é mono-usuário).
    inner: Arc<Mutex<HashMap<Uuid, ImportSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ImportSession) {
        self.inner.lock().await.insert(session.id, session);
    }

    pub async fn get(&self, id: Uuid) -> Result<ImportSession, AppError> {
        self.inner
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound)
    }

    pub async fn remove(&self, id: Uuid) -> Result<ImportSession, AppError> {
        self.inner
            .lock()
            .await
            .remove(&id)
            .ok_or(AppError::SessionNotFound)
    }

    // Acesso exclusivo à sessão durante a operação (edição, aceite, ...).
    pub fn lock(&self) -> &Mutex<HashMap<Uuid, ImportSession>> {
        &self.inner
    }
}
