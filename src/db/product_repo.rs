// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::inventory::Product};

const PRODUCT_COLUMNS: &str =
    "id, cod_produto, nome, fornecedor, estoque_minimo, valor_unitario, foto_url, updated_at";

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM produtos ORDER BY cod_produto ASC");
        let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    // Código não diferencia maiúsculas. A linha fica travada até o fim da
    // transação: vendas e reposições do mesmo produto conferem o saldo uma de cada vez.
    pub async fn find_by_code_for_update<'e, E>(
        &self,
        executor: E,
        code: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos WHERE LOWER(cod_produto) = LOWER($1) FOR UPDATE"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    // Cadastro: insere ou atualiza pelo código (chave de conflito = LOWER(cod_produto))
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        code: &str,
        name: &str,
        supplier: &str,
        minimum_stock: i32,
        unit_price: Decimal,
        photo_url: Option<&str>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO produtos (cod_produto, nome, fornecedor, estoque_minimo, valor_unitario, foto_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (LOWER(cod_produto)) DO UPDATE SET
                nome = EXCLUDED.nome,
                fornecedor = EXCLUDED.fornecedor,
                estoque_minimo = EXCLUDED.estoque_minimo,
                valor_unitario = EXCLUDED.valor_unitario,
                foto_url = COALESCE(EXCLUDED.foto_url, produtos.foto_url),
                updated_at = NOW()
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .bind(name.trim())
            .bind(supplier.trim())
            .bind(minimum_stock)
            .bind(unit_price)
            .bind(photo_url)
            .fetch_one(executor)
            .await?;
        Ok(product)
    }
}
