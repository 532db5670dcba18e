// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Produtos (tabela 'produtos') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[sqlx(rename = "cod_produto")]
    #[schema(example = "CAM-001")]
    pub code: String,

    #[sqlx(rename = "nome")]
    #[schema(example = "Camiseta Tática Preta")]
    pub name: String,

    #[sqlx(rename = "fornecedor")]
    #[schema(example = "Fornecedor")]
    pub supplier: String,

    #[sqlx(rename = "estoque_minimo")]
    #[schema(example = 5)]
    pub minimum_stock: i32,

    #[sqlx(rename = "valor_unitario")]
    #[schema(example = "79.90")]
    pub unit_price: Decimal,

    #[sqlx(rename = "foto_url")]
    pub photo_url: Option<String>,

    pub updated_at: DateTime<Utc>,
}

// --- 2. Locais de estoque ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "local_estoque", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLocation {
    Loja,     // Loja (frente de venda)
    Deposito, // Depósito
}

impl StockLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLocation::Loja => "LOJA",
            StockLocation::Deposito => "DEPOSITO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockLocation::Loja => "LOJA",
            StockLocation::Deposito => "DEPÓSITO",
        }
    }
}

// --- 3. Movimentações (tabela 'estoque', livro de quantidades com sinal) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,

    #[sqlx(rename = "cod_produto")]
    pub product_code: String,

    #[sqlx(rename = "produto")]
    pub product_name: String,

    #[sqlx(rename = "fornecedor")]
    pub supplier: String,

    #[sqlx(rename = "local")]
    pub location: StockLocation,

    // Entrada positiva, saída negativa
    #[sqlx(rename = "qtde")]
    #[schema(example = -2)]
    pub quantity: i32,

    #[sqlx(rename = "data_entrada")]
    #[schema(value_type = String, format = Date, example = "2025-03-07")]
    pub entry_date: NaiveDate,

    pub created_at: DateTime<Utc>,
}

// Movimento ainda não gravado
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub product_code: String,
    pub product_name: String,
    pub supplier: String,
    pub location: StockLocation,
    pub quantity: i32,
    pub entry_date: NaiveDate,
}

// --- 4. Inventário (saldo por produto e local em uma data) ---
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLine {
    pub product_code: String,
    pub product_name: String,
    pub supplier: String,
    pub location: StockLocation,
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationTotals {
    pub quantity: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    #[schema(value_type = String, format = Date)]
    pub as_of: NaiveDate,
    // None = "TODOS" (depósito e loja)
    pub location: Option<StockLocation>,
    pub lines: Vec<InventoryLine>,
    pub store_totals: LocationTotals,
    pub warehouse_totals: LocationTotals,
}

// --- 5. Compras e reposições ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseKind {
    ReposicaoDeposito, // Compra: entrada no depósito
    ReposicaoLoja,     // Transferência: depósito -> loja
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResult {
    pub movements: Vec<StockMovement>,
    pub ledger_entry_id: Uuid,
}
