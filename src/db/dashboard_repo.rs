// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    models::{
        dashboard::{DashboardSummary, LowStockEntry, SalesChartEntry, TopProductEntry},
        ledger::EntryKind,
    },
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Resumo Geral
    pub async fn get_summary<'e, E>(&self, executor: E) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente dos quatro números
        let mut tx = executor.begin().await?;

        // A. Valor bruto de todos os lançamentos
        let total_gross: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(valor_bruto), 0) FROM lancamentos")
                .fetch_one(&mut *tx)
                .await?;

        // B. Quantidade de vendas
        let sales_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM lancamentos WHERE tipo = $1")
                .bind(EntryKind::Venda)
                .fetch_one(&mut *tx)
                .await?;

        // C. Promissórias em carteira
        let promissory_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promissorias")
            .fetch_one(&mut *tx)
            .await?;

        // D. Saldo a receber
        let open_receivables: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(saldo_devedor), 0) FROM promissorias WHERE saldo_devedor > 0",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_gross,
            sales_count,
            promissory_count,
            open_receivables,
        })
    }

    // 2. Gráfico de Linha (Últimos 30 dias)
    pub async fn get_sales_last_30_days<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<SalesChartEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, SalesChartEntry>(
            r#"
            SELECT
                to_char(data, 'YYYY-MM-DD') AS "date",
                SUM(valor_liq) AS "total"
            FROM lancamentos
            WHERE tipo = $1
              AND data >= (CURRENT_DATE - INTERVAL '30 days')
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(EntryKind::Venda)
        .fetch_all(executor)
        .await?;

        Ok(data)
    }

    // 3. Top 5 Produtos (faturamento líquido)
    pub async fn get_top_products<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, TopProductEntry>(
            r#"
            SELECT
                COALESCE(produto, cod_produto, '') AS product_name,
                SUM(qtde)::BIGINT AS total_quantity,
                SUM(valor_liq) AS total_revenue
            FROM lancamentos
            WHERE tipo = $1
            GROUP BY 1
            ORDER BY total_revenue DESC NULLS LAST
            LIMIT 5
            "#,
        )
        .bind(EntryKind::Venda)
        .fetch_all(executor)
        .await?;

        Ok(data)
    }

    // 4. Produtos com estoque total abaixo do mínimo
    pub async fn get_low_stock<'e, E>(&self, executor: E) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let data = sqlx::query_as::<_, LowStockEntry>(
            r#"
            SELECT
                p.cod_produto AS product_code,
                p.nome AS product_name,
                p.estoque_minimo AS minimum_stock,
                COALESCE(SUM(e.qtde), 0)::BIGINT AS total_stock
            FROM produtos p
            LEFT JOIN estoque e ON LOWER(e.cod_produto) = LOWER(p.cod_produto)
            GROUP BY p.id, p.cod_produto, p.nome, p.estoque_minimo
            HAVING COALESCE(SUM(e.qtde), 0) < p.estoque_minimo
            ORDER BY p.cod_produto ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(data)
    }
}
