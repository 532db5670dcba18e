// src/db/stock_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::inventory::{NewStockMovement, StockLocation, StockMovement},
};

const MOVEMENT_COLUMNS: &str =
    "id, cod_produto, produto, fornecedor, local, qtde, data_entrada, created_at";

// Livro de movimentações (tabela 'estoque'): cada linha é uma entrada ou saída com sinal
#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        movement: &NewStockMovement,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO estoque (cod_produto, produto, fornecedor, local, qtde, data_entrada)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(&movement.product_code)
            .bind(&movement.product_name)
            .bind(&movement.supplier)
            .bind(movement.location)
            .bind(movement.quantity)
            .bind(movement.entry_date)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    // Saldo atual de um produto em um local (soma das movimentações)
    pub async fn balance<'e, E>(
        &self,
        executor: E,
        product_code: &str,
        location: StockLocation,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(qtde), 0)::BIGINT
            FROM estoque
            WHERE LOWER(cod_produto) = LOWER($1) AND local = $2
            "#,
        )
        .bind(product_code.trim())
        .bind(location)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    // Movimentações com data de entrada até `as_of` (inclusive)
    pub async fn movements_up_to(&self, as_of: NaiveDate) -> Result<Vec<StockMovement>, AppError> {
        let sql = format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM estoque
            WHERE data_entrada <= $1
            ORDER BY cod_produto ASC, data_entrada ASC
            "#
        );
        let rows = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
