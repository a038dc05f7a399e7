// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub monthly_charge: f64,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// --- MATERIAL / SERVIÇO ---

// Materiais globais aparecem para todos os clientes; os não-globais
// pertencem a um cliente específico.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub default_cost: f64,
    pub unit: Option<String>,
    pub is_global: bool,
    pub description: Option<String>,
}

// --- PREÇO POR CLIENTE ---

// Uma linha por par (cliente, material). O custo efetivo é
// COALESCE(custom_cost, default_cost), resolvido na hora da consulta.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientMaterial {
    pub id: i64,
    pub client_id: i64,
    pub material_id: i64,
    pub custom_cost: Option<f64>,
}

// Visão "juntada" para o frontend: material + preço efetivo do cliente.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientMaterialDetail {
    pub material_id: i64,
    pub name: String,
    pub default_cost: f64,
    pub unit: Option<String>,
    pub custom_cost: Option<f64>,
    pub effective_cost: f64,
}
