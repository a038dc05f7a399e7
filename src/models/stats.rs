// src/models/stats.rs

use serde::Serialize;
use utoipa::ToSchema;

// Indicadores de rentabilidade de um cliente.
//
// Os campos projetados ficam None quando não há dado suficiente (zero
// visitas, ou uma única visita sem intervalo observável): nunca
// inventamos uma frequência.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatistics {
    pub client_id: i64,
    pub client_name: String,
    pub visit_count: i64,
    pub total_material_cost: f64,
    pub monthly_charge: f64,

    pub avg_cost_per_visit: Option<f64>,
    pub visits_per_year: Option<f64>,
    pub calculated_monthly_cost: Option<f64>,
    pub monthly_profit_loss: Option<f64>,
    // Convenção única: lucrativo quando monthly_profit_loss >= 0.
    pub is_profitable: Option<bool>,

    pub insufficient_data: bool,
}
