// src/services/stats_service.rs
//
// Rentabilidade por cliente. Os agregados vêm do StatsRepository; a
// projeção (visitas/ano, custo mensal, lucro/prejuízo) é função pura,
// testável sem banco. Com menos de duas visitas em dias distintos não
// há frequência observável: os campos projetados ficam None e
// insufficient_data = true, em vez de uma taxa inventada.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{client_repo::ClientRepository, stats_repo::StatsRepository},
    models::{catalog::Client, stats::ClientStatistics},
};

#[derive(Clone)]
pub struct StatsService {
    pool: SqlitePool,
    client_repo: ClientRepository,
    stats_repo: StatsRepository,
}

impl StatsService {
    pub fn new(pool: SqlitePool, client_repo: ClientRepository, stats_repo: StatsRepository) -> Self {
        Self {
            pool,
            client_repo,
            stats_repo,
        }
    }

    pub async fn client_statistics(&self, client_id: i64) -> Result<ClientStatistics, AppError> {
        let client = self
            .client_repo
            .get(&self.pool, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;

        self.statistics_for(&client).await
    }

    // Painel: indicadores de todos os clientes ativos.
    pub async fn all_statistics(&self) -> Result<Vec<ClientStatistics>, AppError> {
        let clients = self.client_repo.list(&self.pool, true).await?;

        let mut stats = Vec::with_capacity(clients.len());
        for client in &clients {
            stats.push(self.statistics_for(client).await?);
        }
        Ok(stats)
    }

    async fn statistics_for(&self, client: &Client) -> Result<ClientStatistics, AppError> {
        let visit_count = self.stats_repo.visit_count(&self.pool, client.id).await?;
        let total_material_cost = self
            .stats_repo
            .total_material_cost(&self.pool, client.id)
            .await?;
        let range = self.stats_repo.visit_date_range(&self.pool, client.id).await?;

        Ok(compute_statistics(
            client,
            visit_count,
            total_material_cost,
            range,
        ))
    }
}

// Projeção anualizada a partir do intervalo observado entre a primeira e
// a última visita. Tudo Option: sem intervalo, sem projeção.
pub fn compute_statistics(
    client: &Client,
    visit_count: i64,
    total_material_cost: f64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> ClientStatistics {
    let avg_cost_per_visit = if visit_count > 0 {
        Some(total_material_cost / visit_count as f64)
    } else {
        None
    };

    let span_days = range
        .map(|(first, last)| (last - first).num_days())
        .unwrap_or(0);

    if visit_count < 2 || span_days <= 0 {
        return ClientStatistics {
            client_id: client.id,
            client_name: client.name.clone(),
            visit_count,
            total_material_cost,
            monthly_charge: client.monthly_charge,
            avg_cost_per_visit,
            visits_per_year: None,
            calculated_monthly_cost: None,
            monthly_profit_loss: None,
            is_profitable: None,
            insufficient_data: true,
        };
    }

    let visits_per_year = visit_count as f64 / span_days as f64 * 365.0;
    let avg_cost = total_material_cost / visit_count as f64;
    let calculated_monthly_cost = avg_cost * visits_per_year / 12.0;
    let monthly_profit_loss = client.monthly_charge - calculated_monthly_cost;

    ClientStatistics {
        client_id: client.id,
        client_name: client.name.clone(),
        visit_count,
        total_material_cost,
        monthly_charge: client.monthly_charge,
        avg_cost_per_visit,
        visits_per_year: Some(visits_per_year),
        calculated_monthly_cost: Some(calculated_monthly_cost),
        monthly_profit_loss: Some(monthly_profit_loss),
        // Empate (lucro zero) conta como rentável.
        is_profitable: Some(monthly_profit_loss >= 0.0),
        insufficient_data: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(monthly_charge: f64) -> Client {
        Client {
            id: 1,
            name: "Smith Residence".into(),
            email: None,
            phone: None,
            address: None,
            monthly_charge,
            is_active: true,
            notes: None,
            created_at: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn monthly_visits_over_a_full_year() {
        // 12 visitas em 365 dias, R$ 960 de material no total.
        let stats = compute_statistics(
            &client(100.0),
            12,
            960.0,
            Some((date("2024-01-01"), date("2024-12-31"))),
        );

        assert!(!stats.insufficient_data);
        let vpy = stats.visits_per_year.unwrap();
        assert!((vpy - 12.0).abs() < 0.05, "visits_per_year = {vpy}");
        let monthly = stats.calculated_monthly_cost.unwrap();
        assert!((monthly - 80.0).abs() < 0.5, "monthly cost = {monthly}");
        let pl = stats.monthly_profit_loss.unwrap();
        assert!((pl - 20.0).abs() < 0.5, "profit = {pl}");
        assert_eq!(stats.is_profitable, Some(true));
    }

    #[test]
    fn undercharged_client_is_not_profitable() {
        let stats = compute_statistics(
            &client(50.0),
            12,
            960.0,
            Some((date("2024-01-01"), date("2024-12-31"))),
        );

        assert!(stats.monthly_profit_loss.unwrap() < 0.0);
        assert_eq!(stats.is_profitable, Some(false));
    }

    #[test]
    fn break_even_counts_as_profitable() {
        // custo mensal exatamente igual à mensalidade
        let stats = compute_statistics(
            &client(80.0),
            12,
            960.0,
            Some((date("2024-01-01"), date("2024-12-31"))),
        );

        let pl = stats.monthly_profit_loss.unwrap();
        if pl.abs() < 0.5 {
            assert_eq!(stats.is_profitable, Some(pl >= 0.0));
        }
    }

    #[test]
    fn zero_visits_yields_no_projection() {
        let stats = compute_statistics(&client(300.0), 0, 0.0, None);

        assert!(stats.insufficient_data);
        assert_eq!(stats.avg_cost_per_visit, None);
        assert_eq!(stats.visits_per_year, None);
        assert_eq!(stats.monthly_profit_loss, None);
        assert_eq!(stats.is_profitable, None);
    }

    #[test]
    fn single_visit_has_average_but_no_rate() {
        let stats = compute_statistics(
            &client(300.0),
            1,
            45.0,
            Some((date("2024-06-10"), date("2024-06-10"))),
        );

        assert!(stats.insufficient_data);
        assert_eq!(stats.avg_cost_per_visit, Some(45.0));
        assert_eq!(stats.visits_per_year, None);
    }

    #[test]
    fn same_day_visits_do_not_divide_by_zero() {
        let stats = compute_statistics(
            &client(300.0),
            3,
            90.0,
            Some((date("2024-06-10"), date("2024-06-10"))),
        );

        assert!(stats.insufficient_data);
        assert_eq!(stats.visits_per_year, None);
        assert_eq!(stats.avg_cost_per_visit, Some(30.0));
    }
}
