// src/db/promissory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::promissory::{
        NewPromissoryNote, NewPromissoryPayment, NoteStatus, PromissoryNote, PromissoryPayment,
    },
};

const NOTE_COLUMNS: &str = r#"
    id, nr_venda, cliente, email, telefone, valor, saldo_devedor, data_inicio,
    parcelas, parcelas_atra, status, selecionado, email_enviado, created_at
"#;

const PAYMENT_COLUMNS: &str = r#"
    id, data_pagamento, nr_venda, forma_pagamento, parcelas_atrasadas, cliente,
    saldo_devedor, valor_pago, saldo_devedor_final, created_at
"#;

// Carteira de promissórias e o livro de pagamentos
#[derive(Clone)]
pub struct PromissoryRepository {
    pool: PgPool,
}

impl PromissoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Promissórias
    // ---

    pub async fn insert_note<'e, E>(
        &self,
        executor: E,
        note: &NewPromissoryNote,
    ) -> Result<PromissoryNote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Nasce ABERTO e com saldo igual ao valor
        let sql = format!(
            r#"
            INSERT INTO promissorias (
                nr_venda, cliente, email, telefone, valor, saldo_devedor,
                data_inicio, parcelas, status
            )
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8)
            RETURNING {NOTE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PromissoryNote>(&sql)
            .bind(&note.sale_number)
            .bind(&note.customer)
            .bind(&note.email)
            .bind(&note.phone)
            .bind(note.value)
            .bind(note.start_date)
            .bind(note.installments)
            .bind(NoteStatus::Aberto)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return AppError::SaleNumberAlreadyExists(note.sale_number.clone());
                    }
                }
                e.into()
            })?;
        Ok(row)
    }

    pub async fn list_notes(&self) -> Result<Vec<PromissoryNote>, AppError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM promissorias ORDER BY data_inicio ASC, nr_venda ASC"
        );
        let rows = sqlx::query_as::<_, PromissoryNote>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_selected(&self) -> Result<Vec<PromissoryNote>, AppError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM promissorias WHERE selecionado = TRUE ORDER BY nr_venda ASC"
        );
        let rows = sqlx::query_as::<_, PromissoryNote>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // Trava a linha até o fim da transação do pagamento
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        sale_number: &str,
    ) -> Result<Option<PromissoryNote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM promissorias WHERE nr_venda = $1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, PromissoryNote>(&sql)
            .bind(sale_number.trim())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn set_selected(&self, id: Uuid, selected: bool) -> Result<Option<PromissoryNote>, AppError> {
        let sql = format!(
            "UPDATE promissorias SET selecionado = $2 WHERE id = $1 RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PromissoryNote>(&sql)
            .bind(id)
            .bind(selected)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn mark_email_sent(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE promissorias SET email_enviado = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // Grava saldo, foto do atraso e status recalculados
    pub async fn update_balance<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        balance: Decimal,
        overdue: i32,
        status: NoteStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE promissorias SET saldo_devedor = $2, parcelas_atra = $3, status = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(balance)
        .bind(overdue)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_note<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM promissorias WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Pagamentos
    // ---

    // Só os pagamentos desta promissória, não de outra que já usou o número
    pub async fn total_paid<'e, E>(&self, executor: E, note_id: Uuid) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(valor_pago), 0) FROM pagamentos_promissorias WHERE promissoria_id = $1",
        )
        .bind(note_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        payment: &NewPromissoryPayment,
    ) -> Result<PromissoryPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO pagamentos_promissorias (
                data_pagamento, nr_venda, forma_pagamento, parcelas_atrasadas, cliente,
                saldo_devedor, valor_pago, saldo_devedor_final, promissoria_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PromissoryPayment>(&sql)
            .bind(payment.payment_date)
            .bind(&payment.sale_number)
            .bind(payment.method)
            .bind(payment.overdue_installments)
            .bind(&payment.customer)
            .bind(payment.prior_balance)
            .bind(payment.amount_paid)
            .bind(payment.resulting_balance)
            .bind(payment.note_id)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_payments(&self) -> Result<Vec<PromissoryPayment>, AppError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM pagamentos_promissorias ORDER BY data_pagamento DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, PromissoryPayment>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
