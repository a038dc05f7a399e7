// src/models/visit.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub client_id: i64,
    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub visit_date: NaiveDate,
    // Horários guardados como texto HH:MM, igual ao formato de entrada.
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "11:30")]
    pub end_time: String,
    pub duration_minutes: f64,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitMaterial {
    pub id: i64,
    pub visit_id: i64,
    pub material_id: i64,
    pub quantity: f64,
}

// Material consumido numa visita, já com o custo efetivo atual do cliente.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitMaterialDetail {
    pub id: i64,
    pub visit_id: i64,
    pub material_id: i64,
    pub name: String,
    pub unit: Option<String>,
    pub quantity: f64,
    pub effective_cost: f64,
}
