// src/models/ledger.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::inventory::StockLocation;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_lancamento", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Venda,     // Venda
    Compra,    // Compra (entrada no depósito)
    Reposicao, // Reposição da loja a partir do depósito
    Despesa,   // Despesa
    Doacao,    // Doação
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Venda => "VENDA",
            EntryKind::Compra => "COMPRA",
            EntryKind::Reposicao => "REPOSICAO",
            EntryKind::Despesa => "DESPESA",
            EntryKind::Doacao => "DOACAO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_pagamento", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Pix,
    Debito,
    Credito,
    Dinheiro,
    Promissoria,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Debito => "DEBITO",
            PaymentMethod::Credito => "CREDITO",
            PaymentMethod::Dinheiro => "DINHEIRO",
            PaymentMethod::Promissoria => "PROMISSORIA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_recebimento", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceivableStatus {
    Pendente,
    Recebido,
}

// --- Lançamento (tabela 'lancamentos') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,

    #[sqlx(rename = "data")]
    #[schema(value_type = String, format = Date, example = "2025-03-07")]
    pub date: NaiveDate,

    #[sqlx(rename = "tipo")]
    pub kind: EntryKind,

    #[sqlx(rename = "cod_produto")]
    pub product_code: Option<String>,
    #[sqlx(rename = "produto")]
    pub product_name: Option<String>,
    #[sqlx(rename = "fornecedor")]
    pub supplier: Option<String>,
    #[sqlx(rename = "qtde")]
    pub quantity: Option<i32>,

    // Valores
    #[sqlx(rename = "valor_bruto")]
    #[schema(example = "159.80")]
    pub gross_value: Decimal,
    #[sqlx(rename = "desconto")]
    pub discount: Decimal,
    #[sqlx(rename = "juros")]
    pub interest: Decimal,
    #[sqlx(rename = "valor_liq")]
    #[schema(example = "149.80")]
    pub net_value: Decimal,

    #[sqlx(rename = "forma")]
    pub payment_method: Option<PaymentMethod>,
    #[sqlx(rename = "nr_venda")]
    #[schema(example = "250307-1")]
    pub sale_number: Option<String>,
    #[sqlx(rename = "local")]
    pub location: Option<StockLocation>,
    #[sqlx(rename = "parcelas")]
    pub installments: Option<i32>,
    #[sqlx(rename = "inicio_pagto")]
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_start: Option<NaiveDate>,

    #[sqlx(rename = "cliente")]
    pub customer: Option<String>,
    pub email: Option<String>,
    #[sqlx(rename = "telefone")]
    pub phone: Option<String>,
    #[sqlx(rename = "vendedor")]
    pub salesperson: Option<String>,
    #[sqlx(rename = "status_recb")]
    pub receivable_status: Option<ReceivableStatus>,
    #[sqlx(rename = "descricao")]
    pub description: Option<String>,
    #[sqlx(rename = "registrado_por")]
    pub registered_by: String,

    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    // Valor final: líquido quando houver, senão o bruto
    pub fn final_value(&self) -> Decimal {
        if self.net_value.is_zero() { self.gross_value } else { self.net_value }
    }
}

// Lançamento ainda não gravado
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub supplier: Option<String>,
    pub quantity: Option<i32>,
    pub gross_value: Decimal,
    pub discount: Decimal,
    pub interest: Decimal,
    pub net_value: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub sale_number: Option<String>,
    pub location: Option<StockLocation>,
    pub installments: Option<i32>,
    pub payment_start: Option<NaiveDate>,
    pub customer: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub salesperson: Option<String>,
    pub receivable_status: Option<ReceivableStatus>,
    pub description: Option<String>,
    pub registered_by: String,
}

impl NewLedgerEntry {
    // Lançamento "vazio" de um tipo, para preencher por struct update
    pub fn blank(kind: EntryKind, date: NaiveDate, registered_by: &str) -> Self {
        Self {
            date,
            kind,
            product_code: None,
            product_name: None,
            supplier: None,
            quantity: None,
            gross_value: Decimal::ZERO,
            discount: Decimal::ZERO,
            interest: Decimal::ZERO,
            net_value: Decimal::ZERO,
            payment_method: None,
            sale_number: None,
            location: None,
            installments: None,
            payment_start: None,
            customer: None,
            email: None,
            phone: None,
            salesperson: None,
            receivable_status: None,
            description: None,
            registered_by: registered_by.to_string(),
        }
    }
}

// Filtros do histórico
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

// Resultado do registro de venda
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub entry: LedgerEntry,
    pub stock_movement_id: Uuid,
    pub promissory_note_id: Option<Uuid>,
}
