// src/services/inventory_service.rs

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{LedgerRepository, ProductRepository, StockRepository},
    models::{
        inventory::{
            InventoryLine, InventoryReport, LocationTotals, NewStockMovement, Product,
            PurchaseKind, PurchaseResult, StockLocation, StockMovement,
        },
        ledger::{EntryKind, NewLedgerEntry},
    },
};

// Dados de uma compra / reposição já validados pelo handler
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub kind: PurchaseKind,
    pub date: NaiveDate,
    pub product_code: String,
    pub quantity: i32,
    pub allow_insufficient_stock: bool,
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub supplier: String,
    pub minimum_stock: i32,
    pub unit_price: Decimal,
    pub photo_url: Option<String>,
}

#[derive(Clone)]
pub struct InventoryService {
    product_repo: ProductRepository,
    stock_repo: StockRepository,
    ledger_repo: LedgerRepository,
}

impl InventoryService {
    pub fn new(
        product_repo: ProductRepository,
        stock_repo: StockRepository,
        ledger_repo: LedgerRepository,
    ) -> Self {
        Self { product_repo, stock_repo, ledger_repo }
    }

    // --- PRODUTOS ---

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.product_repo.list().await
    }

    pub async fn save_product<'e, E>(&self, executor: E, input: &ProductInput) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = self
            .product_repo
            .upsert(
                executor,
                &input.code,
                &input.name,
                &input.supplier,
                input.minimum_stock,
                input.unit_price,
                input.photo_url.as_deref(),
            )
            .await?;

        tracing::info!(code = %product.code, "Produto salvo");
        Ok(product)
    }

    // --- COMPRAS E REPOSIÇÕES ---

    pub async fn register_purchase<'e, E>(
        &self,
        executor: E,
        request: &PurchaseRequest,
        registered_by: &str,
    ) -> Result<PurchaseResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .product_repo
            .find_by_code_for_update(&mut *tx, &request.product_code)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(request.product_code.trim().to_string()))?;

        let plan = purchase_plan(request.kind, request.quantity);

        match request.kind {
            PurchaseKind::ReposicaoDeposito => {
                // Compra exige valor unitário no cadastro
                if product.unit_price.is_zero() {
                    return Err(AppError::MissingUnitPrice(product.code.clone()));
                }
            }
            PurchaseKind::ReposicaoLoja => {
                let available = self
                    .stock_repo
                    .balance(&mut *tx, &product.code, StockLocation::Deposito)
                    .await?;
                check_stock(
                    StockLocation::Deposito,
                    available,
                    request.quantity,
                    request.allow_insufficient_stock,
                )?;
            }
        }

        let mut movements: Vec<StockMovement> = Vec::with_capacity(plan.len());
        for (location, quantity) in plan {
            let movement = NewStockMovement {
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                supplier: product.supplier.clone(),
                location,
                quantity,
                entry_date: request.date,
            };
            movements.push(self.stock_repo.insert_movement(&mut *tx, &movement).await?);
        }

        let entry = purchase_ledger_entry(request, &product, registered_by);
        let ledger_entry = self.ledger_repo.insert(&mut *tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            code = %product.code,
            kind = ?request.kind,
            quantity = request.quantity,
            "Movimentação de compra registrada"
        );

        Ok(PurchaseResult {
            movements,
            ledger_entry_id: ledger_entry.id,
        })
    }

    // --- INVENTÁRIO ---

    pub async fn inventory(
        &self,
        as_of: NaiveDate,
        location: Option<StockLocation>,
    ) -> Result<InventoryReport, AppError> {
        let movements = self.stock_repo.movements_up_to(as_of).await?;
        let products = self.product_repo.list().await?;
        Ok(build_inventory(&movements, &products, as_of, location))
    }
}

/// Confere o saldo antes de uma saída. `Ok(true)` quando falta estoque e o
/// operador confirmou mesmo assim.
pub fn check_stock(
    location: StockLocation,
    available: i64,
    requested: i32,
    allow_insufficient: bool,
) -> Result<bool, AppError> {
    if available >= requested as i64 {
        return Ok(false);
    }
    if !allow_insufficient {
        return Err(AppError::InsufficientStock {
            location: location.label().to_string(),
            available,
            requested,
        });
    }
    Ok(true)
}

// Movimentos de estoque gerados por cada tipo de transação
fn purchase_plan(kind: PurchaseKind, quantity: i32) -> Vec<(StockLocation, i32)> {
    match kind {
        PurchaseKind::ReposicaoDeposito => vec![(StockLocation::Deposito, quantity)],
        PurchaseKind::ReposicaoLoja => vec![
            (StockLocation::Deposito, -quantity),
            (StockLocation::Loja, quantity),
        ],
    }
}

fn purchase_ledger_entry(request: &PurchaseRequest, product: &Product, registered_by: &str) -> NewLedgerEntry {
    let (kind, location, value) = match request.kind {
        PurchaseKind::ReposicaoDeposito => (
            EntryKind::Compra,
            StockLocation::Deposito,
            product.unit_price * Decimal::from(request.quantity),
        ),
        // Transferência interna não movimenta dinheiro
        PurchaseKind::ReposicaoLoja => (EntryKind::Reposicao, StockLocation::Loja, Decimal::ZERO),
    };

    NewLedgerEntry {
        product_code: Some(product.code.clone()),
        product_name: Some(product.name.clone()),
        supplier: Some(product.supplier.clone()),
        quantity: Some(request.quantity),
        gross_value: value,
        net_value: value,
        location: Some(location),
        ..NewLedgerEntry::blank(kind, request.date, registered_by)
    }
}

/// Saldo por produto e local até `as_of`.
///
/// Os totais por local consideram todas as linhas, mesmo quando a listagem
/// é filtrada por um único local. Linhas com saldo zero não aparecem.
pub fn build_inventory(
    movements: &[StockMovement],
    products: &[Product],
    as_of: NaiveDate,
    location: Option<StockLocation>,
) -> InventoryReport {
    let prices: HashMap<String, Decimal> = products
        .iter()
        .map(|p| (p.code.to_lowercase(), p.unit_price))
        .collect();

    let mut grouped: BTreeMap<(String, StockLocation), InventoryLine> = BTreeMap::new();
    for movement in movements.iter().filter(|m| m.entry_date <= as_of) {
        let key = (movement.product_code.to_lowercase(), movement.location);
        let line = grouped.entry(key).or_insert_with(|| InventoryLine {
            product_code: movement.product_code.clone(),
            product_name: movement.product_name.clone(),
            supplier: movement.supplier.clone(),
            location: movement.location,
            quantity: 0,
            unit_price: prices
                .get(&movement.product_code.to_lowercase())
                .copied()
                .unwrap_or(Decimal::ZERO),
        });
        line.quantity += movement.quantity as i64;
    }

    let all_lines: Vec<InventoryLine> = grouped
        .into_values()
        .filter(|line| line.quantity != 0)
        .collect();

    let totals_for = |loc: StockLocation| {
        all_lines
            .iter()
            .filter(|l| l.location == loc)
            .fold(LocationTotals::default(), |acc, l| LocationTotals {
                quantity: acc.quantity + l.quantity,
                value: acc.value + l.unit_price * Decimal::from(l.quantity),
            })
    };
    let store_totals = totals_for(StockLocation::Loja);
    let warehouse_totals = totals_for(StockLocation::Deposito);

    let lines = all_lines
        .into_iter()
        .filter(|l| location.is_none_or(|loc| l.location == loc))
        .collect();

    InventoryReport {
        as_of,
        location,
        lines,
        store_totals,
        warehouse_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn movement(code: &str, location: StockLocation, quantity: i32, day: u32) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4(),
            product_code: code.into(),
            product_name: format!("Produto {}", code),
            supplier: "Fornecedor".into(),
            location,
            quantity,
            entry_date: date(day),
            created_at: Utc::now(),
        }
    }

    fn product(code: &str, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            code: code.into(),
            name: format!("Produto {}", code),
            supplier: "Fornecedor".into(),
            minimum_stock: 0,
            unit_price: price.parse().unwrap(),
            photo_url: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_counts_movements_up_to_the_date() {
        let movements = vec![
            movement("A1", StockLocation::Deposito, 10, 1),
            movement("A1", StockLocation::Deposito, 5, 10),
        ];
        let report = build_inventory(&movements, &[product("A1", "2.00")], date(5), None);

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].quantity, 10);
        assert_eq!(report.warehouse_totals.value, "20.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn codes_group_without_case_and_zero_lines_vanish() {
        let movements = vec![
            movement("a1", StockLocation::Loja, 3, 1),
            movement("A1", StockLocation::Loja, -3, 2),
            movement("B2", StockLocation::Loja, 4, 2),
        ];
        let report = build_inventory(&movements, &[], date(31), None);

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].product_code, "B2");
        assert_eq!(report.lines[0].unit_price, Decimal::ZERO);
    }

    #[test]
    fn totals_ignore_the_location_filter() {
        let movements = vec![
            movement("A1", StockLocation::Deposito, 10, 1),
            movement("A1", StockLocation::Loja, 2, 1),
        ];
        let products = [product("A1", "5.00")];
        let report = build_inventory(&movements, &products, date(31), Some(StockLocation::Loja));

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].location, StockLocation::Loja);
        assert_eq!(report.store_totals.quantity, 2);
        assert_eq!(report.warehouse_totals.quantity, 10);
        assert_eq!(report.warehouse_totals.value, "50.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn replenishment_moves_from_warehouse_to_store() {
        assert_eq!(
            purchase_plan(PurchaseKind::ReposicaoLoja, 4),
            vec![(StockLocation::Deposito, -4), (StockLocation::Loja, 4)]
        );
        assert_eq!(
            purchase_plan(PurchaseKind::ReposicaoDeposito, 4),
            vec![(StockLocation::Deposito, 4)]
        );
    }

    #[test]
    fn purchase_entry_is_valued_at_the_catalog_price() {
        let request = PurchaseRequest {
            kind: PurchaseKind::ReposicaoDeposito,
            date: date(7),
            product_code: "a1".into(),
            quantity: 3,
            allow_insufficient_stock: false,
        };
        let entry = purchase_ledger_entry(&request, &product("A1", "12.50"), "gerente");

        assert_eq!(entry.kind, EntryKind::Compra);
        assert_eq!(entry.gross_value, "37.50".parse::<Decimal>().unwrap());
        assert_eq!(entry.product_code.as_deref(), Some("A1"));
        assert_eq!(entry.registered_by, "gerente");
    }

    #[test]
    fn short_stock_is_a_conflict_unless_confirmed() {
        let err = check_stock(StockLocation::Loja, 2, 5, false).unwrap_err();
        match err {
            AppError::InsufficientStock { location, available, requested } => {
                assert_eq!(location, "LOJA");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("erro inesperado: {:?}", other),
        }

        assert!(check_stock(StockLocation::Deposito, 2, 5, true).unwrap());
        assert!(!check_stock(StockLocation::Loja, 5, 5, false).unwrap());
        assert!(!check_stock(StockLocation::Loja, 9, 1, true).unwrap());
    }
}
