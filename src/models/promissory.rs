// src/models/promissory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_promissoria", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    Aberto,   // Em dia
    Pendente, // Parcelas vencidas
    Quitado,  // Saldo zerado
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Aberto => "ABERTO",
            NoteStatus::Pendente => "PENDENTE",
            NoteStatus::Quitado => "QUITADO",
        }
    }
}

// Como o cliente quitou a parcela (tela de pagamento)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_quitacao", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementMethod {
    Dinheiro,
    Pix,
    CartaoCredito,
    CartaoDebito,
    Boleto,
    Transferencia,
}

// --- 1. Promissória (tabela 'promissorias') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromissoryNote {
    pub id: Uuid,

    #[sqlx(rename = "nr_venda")]
    #[schema(example = "250307-1")]
    pub sale_number: String,

    #[sqlx(rename = "cliente")]
    pub customer: String,
    pub email: Option<String>,
    #[sqlx(rename = "telefone")]
    pub phone: Option<String>,

    // Valor original da venda
    #[sqlx(rename = "valor")]
    pub value: Decimal,

    #[sqlx(rename = "saldo_devedor")]
    pub balance: Decimal,

    #[sqlx(rename = "data_inicio")]
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,

    #[sqlx(rename = "parcelas")]
    pub installments: i32,

    // Foto do atraso no momento da gravação; a listagem recalcula
    #[sqlx(rename = "parcelas_atra")]
    pub overdue_snapshot: i32,

    pub status: NoteStatus,

    #[sqlx(rename = "selecionado")]
    pub selected: bool,

    pub email_enviado: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPromissoryNote {
    pub sale_number: String,
    pub customer: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub value: Decimal,
    pub start_date: NaiveDate,
    pub installments: i32,
}

// Promissória com atraso e status calculados para "hoje"
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromissoryNoteView {
    #[serde(flatten)]
    pub note: PromissoryNote,
    pub overdue_installments: i32,
    pub computed_status: NoteStatus,
}

// Consolidado por cliente (soma da lista filtrada)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerConsolidation {
    pub customer: String,
    pub email: Option<String>,
    pub total_balance: Decimal,
    pub overdue_installments: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromissoryListing {
    #[schema(value_type = String, format = Date)]
    pub today: NaiveDate,
    pub notes: Vec<PromissoryNoteView>,
    pub by_customer: Vec<CustomerConsolidation>,
}

// --- 2. Pagamentos (tabela 'pagamentos_promissorias') ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromissoryPayment {
    pub id: Uuid,

    #[sqlx(rename = "data_pagamento")]
    #[schema(value_type = String, format = Date)]
    pub payment_date: NaiveDate,

    #[sqlx(rename = "nr_venda")]
    pub sale_number: String,

    #[sqlx(rename = "forma_pagamento")]
    pub method: SettlementMethod,

    #[sqlx(rename = "parcelas_atrasadas")]
    pub overdue_installments: i32,

    #[sqlx(rename = "cliente")]
    pub customer: String,

    // Saldo antes do pagamento
    #[sqlx(rename = "saldo_devedor")]
    pub prior_balance: Decimal,

    #[sqlx(rename = "valor_pago")]
    pub amount_paid: Decimal,

    #[sqlx(rename = "saldo_devedor_final")]
    pub resulting_balance: Decimal,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPromissoryPayment {
    pub note_id: Uuid,
    pub payment_date: NaiveDate,
    pub sale_number: String,
    pub method: SettlementMethod,
    pub overdue_installments: i32,
    pub customer: String,
    pub prior_balance: Decimal,
    pub amount_paid: Decimal,
    pub resulting_balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: PromissoryPayment,
    // true quando o saldo zerou e a promissória saiu da carteira
    pub settled: bool,
}

// --- 3. Cobrança por e-mail ---
#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub sent: u32,
    pub skipped_without_email: u32,
    pub skipped_already_sent: u32,
}
