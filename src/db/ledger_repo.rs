// src/db/ledger_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::ledger::{EntryKind, HistoryFilter, LedgerEntry, NewLedgerEntry, ReceivableStatus},
};

// Chave do advisory lock que serializa a numeração das vendas
const SALE_NUMBER_LOCK: i64 = 0x4c4f_4a41_5645_4e44;

// Índice único parcial de nr_venda nas linhas VENDA
const SALE_NUMBER_INDEX: &str = "idx_lancamentos_venda_nr";

const ENTRY_COLUMNS: &str = r#"
    id, data, tipo, cod_produto, produto, fornecedor, qtde,
    valor_bruto, desconto, juros, valor_liq, forma, nr_venda, local,
    parcelas, inicio_pagto, cliente, email, telefone, vendedor,
    status_recb, descricao, registrado_por, created_at
"#;

// Lançamentos (vendas, compras, reposições, despesas e doações)
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        entry: &NewLedgerEntry,
    ) -> Result<LedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO lancamentos (
                data, tipo, cod_produto, produto, fornecedor, qtde,
                valor_bruto, desconto, juros, valor_liq, forma, nr_venda, local,
                parcelas, inicio_pagto, cliente, email, telefone, vendedor,
                status_recb, descricao, registrado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING {ENTRY_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(entry.date)
            .bind(entry.kind)
            .bind(&entry.product_code)
            .bind(&entry.product_name)
            .bind(&entry.supplier)
            .bind(entry.quantity)
            .bind(entry.gross_value)
            .bind(entry.discount)
            .bind(entry.interest)
            .bind(entry.net_value)
            .bind(entry.payment_method)
            .bind(&entry.sale_number)
            .bind(entry.location)
            .bind(entry.installments)
            .bind(entry.payment_start)
            .bind(&entry.customer)
            .bind(&entry.email)
            .bind(&entry.phone)
            .bind(&entry.salesperson)
            .bind(entry.receivable_status)
            .bind(&entry.description)
            .bind(&entry.registered_by)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() && db_err.constraint() == Some(SALE_NUMBER_INDEX) {
                        return AppError::SaleNumberAlreadyExists(
                            entry.sale_number.clone().unwrap_or_default(),
                        );
                    }
                }
                e.into()
            })?;
        Ok(row)
    }

    // Histórico com filtros opcionais (período e forma de pagamento)
    pub async fn list(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ENTRY_COLUMNS} FROM lancamentos WHERE 1 = 1"));

        if let Some(from) = filter.from {
            builder.push(" AND data >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND data <= ").push_bind(to);
        }
        if let Some(method) = filter.payment_method {
            builder.push(" AND forma = ").push_bind(method);
        }
        builder.push(" ORDER BY data DESC, created_at DESC");

        let rows = builder
            .build_query_as::<LedgerEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // Segura a numeração até o fim da transação da venda
    pub async fn lock_sale_numbers<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SALE_NUMBER_LOCK)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Vendas já registradas no dia (base do número da venda)
    pub async fn count_sales_on<'e, E>(&self, executor: E, date: NaiveDate) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lancamentos WHERE tipo = $1 AND data = $2",
        )
        .bind(EntryKind::Venda)
        .bind(date)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    // Números de venda já usados que começam com o prefixo (ex.: "250307-")
    pub async fn sale_numbers_with_prefix<'e, E>(
        &self,
        executor: E,
        prefix: &str,
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT nr_venda FROM lancamentos WHERE tipo = $1 AND starts_with(nr_venda, $2)",
        )
        .bind(EntryKind::Venda)
        .bind(prefix)
        .fetch_all(executor)
        .await?;
        Ok(numbers)
    }

    pub async fn sale_number_exists<'e, E>(&self, executor: E, sale_number: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM lancamentos WHERE tipo = $1 AND nr_venda = $2)",
        )
        .bind(EntryKind::Venda)
        .bind(sale_number)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // Venda a prazo quitada: o lançamento passa a RECEBIDO
    pub async fn mark_received<'e, E>(&self, executor: E, sale_number: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE lancamentos SET status_recb = $2 WHERE nr_venda = $1 AND tipo = $3",
        )
        .bind(sale_number)
        .bind(ReceivableStatus::Recebido)
        .bind(EntryKind::Venda)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
