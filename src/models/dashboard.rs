// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// 1. Resumo (Os Cards do Topo)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_gross: Decimal,       // Soma do valor bruto de todos os lançamentos
    pub sales_count: i64,           // Quantidade de lançamentos de venda
    pub promissory_count: i64,      // Promissórias em carteira
    pub open_receivables: Decimal,  // Saldo devedor em aberto
}

// 2. Gráfico de Vendas (Últimos 30 dias)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesChartEntry {
    pub date: Option<String>, // YYYY-MM-DD
    pub total: Option<Decimal>,
}

// 3. Top Produtos (por faturamento)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_name: String,
    pub total_quantity: Option<i64>,
    pub total_revenue: Option<Decimal>,
}

// 4. Estoque abaixo do mínimo
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub product_code: String,
    pub product_name: String,
    pub minimum_stock: i32,
    pub total_stock: i64,
}
