// src/services/sales_service.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{LedgerRepository, ProductRepository, PromissoryRepository, StockRepository},
    models::{
        inventory::{NewStockMovement, StockLocation},
        ledger::{EntryKind, NewLedgerEntry, PaymentMethod, ReceivableStatus, SaleReceipt},
        promissory::NewPromissoryNote,
    },
    services::inventory_service::check_stock,
};

// Venda já validada pelo handler
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub date: NaiveDate,
    pub product_code: String,
    pub quantity: i32,
    pub discount: Decimal,
    pub interest: Decimal,
    pub payment_method: PaymentMethod,
    pub sale_number: Option<String>,
    pub installments: Option<i32>,
    pub payment_start: Option<NaiveDate>,
    pub customer: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub salesperson: Option<String>,
    pub allow_insufficient_stock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleValues {
    pub gross: Decimal,
    pub net: Decimal,
}

/// Bruto = unitário × quantidade; líquido = bruto − desconto + juros.
pub fn sale_values(unit_price: Decimal, quantity: i32, discount: Decimal, interest: Decimal) -> SaleValues {
    let gross = unit_price * Decimal::from(quantity);
    SaleValues {
        gross,
        net: gross - discount + interest,
    }
}

/// Crédito começa a ser pago no dia 5 do mês seguinte à venda.
pub fn credit_payment_start(sale_date: NaiveDate) -> NaiveDate {
    let (year, month) = if sale_date.month() == 12 {
        (sale_date.year() + 1, 1)
    } else {
        (sale_date.year(), sale_date.month() + 1)
    };
    // Dia 5 existe em todos os meses
    NaiveDate::from_ymd_opt(year, month, 5).unwrap_or(sale_date)
}

pub fn sale_number_prefix(date: NaiveDate) -> String {
    format!("{}-", date.format("%y%m%d"))
}

/// Número da venda: "AAMMDD-N", N = vendas já registradas no dia + 1.
/// Se esse número já foi digitado em outra venda, sobe até o primeiro livre.
pub fn next_sale_number(date: NaiveDate, sales_already_today: i64, taken: &[String]) -> String {
    let prefix = sale_number_prefix(date);
    let mut n = sales_already_today.max(0) + 1;
    loop {
        let candidate = format!("{prefix}{n}");
        if !taken.iter().any(|t| *t == candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[derive(Clone)]
pub struct SalesService {
    product_repo: ProductRepository,
    stock_repo: StockRepository,
    ledger_repo: LedgerRepository,
    promissory_repo: PromissoryRepository,
}

impl SalesService {
    pub fn new(
        product_repo: ProductRepository,
        stock_repo: StockRepository,
        ledger_repo: LedgerRepository,
        promissory_repo: PromissoryRepository,
    ) -> Self {
        Self { product_repo, stock_repo, ledger_repo, promissory_repo }
    }

    // Saída da loja + promissória (se houver) + lançamento, tudo ou nada
    pub async fn register_sale<'e, E>(
        &self,
        executor: E,
        request: &SaleRequest,
        registered_by: &str,
    ) -> Result<SaleReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .product_repo
            .find_by_code_for_update(&mut *tx, &request.product_code)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(request.product_code.trim().to_string()))?;

        let available = self
            .stock_repo
            .balance(&mut *tx, &product.code, StockLocation::Loja)
            .await?;
        let short = check_stock(
            StockLocation::Loja,
            available,
            request.quantity,
            request.allow_insufficient_stock,
        )?;
        if short {
            tracing::warn!(
                code = %product.code,
                available,
                requested = request.quantity,
                "Venda confirmada com estoque insuficiente na loja"
            );
        }

        let values = sale_values(product.unit_price, request.quantity, request.discount, request.interest);

        // Uma venda por vez escolhe e grava o número
        self.ledger_repo.lock_sale_numbers(&mut *tx).await?;
        let number = match request.sale_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => {
                if self.ledger_repo.sale_number_exists(&mut *tx, n).await? {
                    return Err(AppError::SaleNumberAlreadyExists(n.to_string()));
                }
                n.to_string()
            }
            _ => {
                let already = self.ledger_repo.count_sales_on(&mut *tx, request.date).await?;
                let taken = self
                    .ledger_repo
                    .sale_numbers_with_prefix(&mut *tx, &sale_number_prefix(request.date))
                    .await?;
                next_sale_number(request.date, already, &taken)
            }
        };

        let payment_start = match request.payment_method {
            PaymentMethod::Credito => Some(credit_payment_start(request.date)),
            _ => request.payment_start,
        };

        // 1) Saída na LOJA
        let movement = self
            .stock_repo
            .insert_movement(
                &mut *tx,
                &NewStockMovement {
                    product_code: product.code.clone(),
                    product_name: product.name.clone(),
                    supplier: product.supplier.clone(),
                    location: StockLocation::Loja,
                    quantity: -request.quantity,
                    entry_date: request.date,
                },
            )
            .await?;

        // 2) Promissória
        let is_promissory = request.payment_method == PaymentMethod::Promissoria;
        let promissory_note_id = if is_promissory {
            let note = self
                .promissory_repo
                .insert_note(
                    &mut *tx,
                    &NewPromissoryNote {
                        sale_number: number.clone(),
                        customer: request.customer.clone().unwrap_or_default(),
                        email: request.email.clone(),
                        phone: request.phone.clone(),
                        value: values.net,
                        start_date: payment_start.unwrap_or(request.date),
                        installments: request.installments.filter(|n| *n > 0).unwrap_or(1),
                    },
                )
                .await?;
            Some(note.id)
        } else {
            None
        };

        // 3) Lançamento
        let entry = NewLedgerEntry {
            product_code: Some(product.code.clone()),
            product_name: Some(product.name.clone()),
            supplier: Some(product.supplier.clone()),
            quantity: Some(request.quantity),
            gross_value: values.gross,
            discount: request.discount,
            interest: request.interest,
            net_value: values.net,
            payment_method: Some(request.payment_method),
            sale_number: Some(number.clone()),
            location: Some(StockLocation::Loja),
            installments: request.installments,
            payment_start,
            customer: request.customer.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            salesperson: request.salesperson.clone(),
            receivable_status: Some(if is_promissory {
                ReceivableStatus::Pendente
            } else {
                ReceivableStatus::Recebido
            }),
            ..NewLedgerEntry::blank(EntryKind::Venda, request.date, registered_by)
        };
        let entry = self.ledger_repo.insert(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            sale_number = %number,
            code = %product.code,
            quantity = request.quantity,
            net = %values.net,
            method = request.payment_method.as_str(),
            "Venda registrada"
        );

        Ok(SaleReceipt {
            entry,
            stock_movement_id: movement.id,
            promissory_note_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn net_is_gross_minus_discount_plus_interest() {
        let values = sale_values(dec("79.90"), 2, dec("10.00"), dec("1.50"));
        assert_eq!(values.gross, dec("159.80"));
        assert_eq!(values.net, dec("151.30"));
    }

    #[test]
    fn credit_starts_on_the_fifth_of_next_month() {
        assert_eq!(credit_payment_start(date(2025, 3, 7)), date(2025, 4, 5));
        assert_eq!(credit_payment_start(date(2025, 1, 31)), date(2025, 2, 5));
    }

    #[test]
    fn december_credit_rolls_into_next_year() {
        assert_eq!(credit_payment_start(date(2024, 12, 20)), date(2025, 1, 5));
    }

    fn taken(numbers: &[&str]) -> Vec<String> {
        numbers.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn sale_numbers_count_the_day() {
        assert_eq!(next_sale_number(date(2025, 3, 7), 0, &[]), "250307-1");
        assert_eq!(
            next_sale_number(date(2025, 3, 7), 4, &taken(&["250307-1", "250307-2", "250307-3", "250307-4"])),
            "250307-5"
        );
        assert_eq!(next_sale_number(date(2030, 11, 1), 0, &[]), "301101-1");
    }

    #[test]
    fn typed_number_ahead_of_the_count_is_skipped() {
        // Digitaram "250307-2" na primeira venda do dia
        let used = taken(&["250307-2"]);
        assert_eq!(next_sale_number(date(2025, 3, 7), 1, &used), "250307-3");

        let used = taken(&["250307-2", "250307-3"]);
        assert_eq!(next_sale_number(date(2025, 3, 7), 2, &used), "250307-4");
    }

    #[test]
    fn numbers_typed_on_other_days_do_not_matter() {
        let used = taken(&["250306-1", "250306-2", "X"]);
        assert_eq!(next_sale_number(date(2025, 3, 7), 0, &used), "250307-1");
    }
}

// Rodam contra um Postgres de verdade: DATABASE_URL=... cargo test -- --ignored
#[cfg(test)]
mod pg_tests {
    use super::*;
    use sqlx::PgPool;

    use crate::models::ledger::HistoryFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(pool: &PgPool) -> SalesService {
        SalesService::new(
            ProductRepository::new(pool.clone()),
            StockRepository::new(pool.clone()),
            LedgerRepository::new(pool.clone()),
            PromissoryRepository::new(pool.clone()),
        )
    }

    async fn seed_product(pool: &PgPool, code: &str, price: &str, store_quantity: i32) {
        let product = ProductRepository::new(pool.clone())
            .upsert(pool, code, "Camiseta", "Malharia", 1, price.parse().unwrap(), None)
            .await
            .unwrap();
        StockRepository::new(pool.clone())
            .insert_movement(
                pool,
                &NewStockMovement {
                    product_code: product.code,
                    product_name: product.name,
                    supplier: product.supplier,
                    location: StockLocation::Loja,
                    quantity: store_quantity,
                    entry_date: date(2025, 3, 1),
                },
            )
            .await
            .unwrap();
    }

    async fn store_balance(pool: &PgPool, code: &str) -> i64 {
        StockRepository::new(pool.clone())
            .balance(pool, code, StockLocation::Loja)
            .await
            .unwrap()
    }

    async fn sales(pool: &PgPool) -> Vec<crate::models::ledger::LedgerEntry> {
        LedgerRepository::new(pool.clone())
            .list(&HistoryFilter::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.kind == EntryKind::Venda)
            .collect()
    }

    fn request(method: PaymentMethod, sale_number: Option<&str>, quantity: i32) -> SaleRequest {
        SaleRequest {
            date: date(2025, 3, 7),
            product_code: "cam-01".into(),
            quantity,
            discount: Decimal::ZERO,
            interest: Decimal::ZERO,
            payment_method: method,
            sale_number: sale_number.map(str::to_string),
            installments: Some(3),
            payment_start: Some(date(2025, 4, 5)),
            customer: Some("Maria".into()),
            email: Some("maria@exemplo.com".into()),
            phone: None,
            salesperson: Some("Joana".into()),
            allow_insufficient_stock: false,
        }
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn promissory_sale_writes_movement_note_and_entry(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 10).await;

        let receipt = service(&pool)
            .register_sale(&pool, &request(PaymentMethod::Promissoria, None, 2), "caixa")
            .await
            .unwrap();

        assert_eq!(receipt.entry.sale_number.as_deref(), Some("250307-1"));
        assert_eq!(receipt.entry.net_value, "100.00".parse::<Decimal>().unwrap());
        assert_eq!(receipt.entry.receivable_status, Some(ReceivableStatus::Pendente));
        assert!(receipt.promissory_note_id.is_some());
        assert_eq!(store_balance(&pool, "CAM-01").await, 8);

        let note = PromissoryRepository::new(pool.clone())
            .find_for_update(&pool, "250307-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.balance, "100.00".parse::<Decimal>().unwrap());
        assert_eq!(note.start_date, date(2025, 4, 5));
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn typed_number_does_not_block_later_automatic_sales(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 10).await;
        let svc = service(&pool);

        svc.register_sale(&pool, &request(PaymentMethod::Promissoria, Some("250307-2"), 1), "caixa")
            .await
            .unwrap();
        let second = svc
            .register_sale(&pool, &request(PaymentMethod::Promissoria, None, 1), "caixa")
            .await
            .unwrap();
        let third = svc
            .register_sale(&pool, &request(PaymentMethod::Promissoria, None, 1), "caixa")
            .await
            .unwrap();

        assert_eq!(second.entry.sale_number.as_deref(), Some("250307-3"));
        assert_eq!(third.entry.sale_number.as_deref(), Some("250307-4"));
        assert_eq!(sales(&pool).await.len(), 3);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn reused_sale_number_is_a_conflict(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 10).await;
        let svc = service(&pool);

        svc.register_sale(&pool, &request(PaymentMethod::Pix, Some("X-1"), 1), "caixa")
            .await
            .unwrap();
        let err = svc
            .register_sale(&pool, &request(PaymentMethod::Promissoria, Some(" X-1 "), 1), "caixa")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SaleNumberAlreadyExists(ref n) if n == "X-1"));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert_eq!(store_balance(&pool, "CAM-01").await, 9);
        assert_eq!(sales(&pool).await.len(), 1);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn failed_note_rolls_back_the_stock_movement(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 10).await;
        // Promissória antiga sem lançamento de venda com o mesmo número
        PromissoryRepository::new(pool.clone())
            .insert_note(
                &pool,
                &NewPromissoryNote {
                    sale_number: "250101-9".into(),
                    customer: "Pedro".into(),
                    email: None,
                    phone: None,
                    value: "40.00".parse().unwrap(),
                    start_date: date(2025, 1, 5),
                    installments: 1,
                },
            )
            .await
            .unwrap();

        let err = service(&pool)
            .register_sale(&pool, &request(PaymentMethod::Promissoria, Some("250101-9"), 3), "caixa")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SaleNumberAlreadyExists(_)));
        assert_eq!(store_balance(&pool, "CAM-01").await, 10);
        assert!(sales(&pool).await.is_empty());
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn short_store_stock_needs_confirmation(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 1).await;
        let svc = service(&pool);

        let err = svc
            .register_sale(&pool, &request(PaymentMethod::Dinheiro, None, 3), "caixa")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 1, requested: 3, .. }));
        assert_eq!(store_balance(&pool, "CAM-01").await, 1);

        let mut confirmed = request(PaymentMethod::Dinheiro, None, 3);
        confirmed.allow_insufficient_stock = true;
        let receipt = svc.register_sale(&pool, &confirmed, "caixa").await.unwrap();
        assert_eq!(receipt.entry.receivable_status, Some(ReceivableStatus::Recebido));
        assert_eq!(store_balance(&pool, "CAM-01").await, -2);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn concurrent_sales_cannot_oversell(pool: PgPool) {
        seed_product(&pool, "CAM-01", "50.00", 1).await;
        let svc = service(&pool);
        let req = request(PaymentMethod::Pix, None, 1);

        let (a, b) = tokio::join!(
            svc.register_sale(&pool, &req, "caixa-1"),
            svc.register_sale(&pool, &req, "caixa-2"),
        );

        let ok = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1, "a: {:?} / b: {:?}", a.as_ref().err(), b.as_ref().err());
        assert!([a, b]
            .into_iter()
            .any(|r| matches!(r, Err(AppError::InsufficientStock { .. }))));
        assert_eq!(store_balance(&pool, "CAM-01").await, 0);
    }
}
