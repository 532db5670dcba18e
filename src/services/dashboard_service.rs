// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::{DashboardSummary, LowStockEntry, SalesChartEntry, TopProductEntry},
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary<'e, E>(&self, executor: E) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.repo.get_summary(executor).await
    }

    pub async fn get_sales_chart<'e, E>(&self, executor: E) -> Result<Vec<SalesChartEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_sales_last_30_days(executor).await
    }

    pub async fn get_top_products<'e, E>(&self, executor: E) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_top_products(executor).await
    }

    pub async fn get_low_stock<'e, E>(&self, executor: E) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_low_stock(executor).await
    }
}
