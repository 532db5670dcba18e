// src/services/ledger_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::{LedgerRepository, ProductRepository, StockRepository},
    models::{
        inventory::{NewStockMovement, StockLocation},
        ledger::{EntryKind, HistoryFilter, LedgerEntry, NewLedgerEntry},
    },
};

const CSV_HEADER: [&str; 7] = [
    "Data",
    "Tipo",
    "Nr Venda",
    "Forma Pgto",
    "Produto",
    "Qtde",
    "Valor Final da Venda",
];

// Lançamento avulso (despesa ou doação)
#[derive(Debug, Clone)]
pub struct ManualEntryRequest {
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub value: Decimal,
    pub description: Option<String>,
    // Doação de mercadoria: sai da loja
    pub product_code: Option<String>,
    pub quantity: Option<i32>,
}

#[derive(Clone)]
pub struct LedgerService {
    ledger_repo: LedgerRepository,
    product_repo: ProductRepository,
    stock_repo: StockRepository,
}

impl LedgerService {
    pub fn new(
        ledger_repo: LedgerRepository,
        product_repo: ProductRepository,
        stock_repo: StockRepository,
    ) -> Self {
        Self { ledger_repo, product_repo, stock_repo }
    }

    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<LedgerEntry>, AppError> {
        self.ledger_repo.list(filter).await
    }

    pub async fn export_csv(&self, filter: &HistoryFilter) -> Result<String, AppError> {
        let entries = self.ledger_repo.list(filter).await?;
        Ok(render_csv(&entries))
    }

    pub async fn record_manual_entry<'e, E>(
        &self,
        executor: E,
        request: &ManualEntryRequest,
        registered_by: &str,
    ) -> Result<LedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut entry = NewLedgerEntry {
            gross_value: request.value,
            net_value: request.value,
            description: request.description.clone(),
            ..NewLedgerEntry::blank(request.kind, request.date, registered_by)
        };

        let donated_goods = match request.kind {
            EntryKind::Doacao => request
                .product_code
                .as_deref()
                .zip(request.quantity.filter(|q| *q > 0)),
            _ => None,
        };

        if let Some((code, quantity)) = donated_goods {
            let product = self
                .product_repo
                .find_by_code_for_update(&mut *tx, code)
                .await?
                .ok_or_else(|| AppError::ProductNotFound(code.trim().to_string()))?;

            self.stock_repo
                .insert_movement(
                    &mut *tx,
                    &NewStockMovement {
                        product_code: product.code.clone(),
                        product_name: product.name.clone(),
                        supplier: product.supplier.clone(),
                        location: StockLocation::Loja,
                        quantity: -quantity,
                        entry_date: request.date,
                    },
                )
                .await?;

            entry.product_code = Some(product.code);
            entry.product_name = Some(product.name);
            entry.supplier = Some(product.supplier);
            entry.quantity = Some(quantity);
            entry.location = Some(StockLocation::Loja);
        }

        let saved = self.ledger_repo.insert(&mut *tx, &entry).await?;
        tx.commit().await?;

        tracing::info!(kind = saved.kind.as_str(), value = %saved.gross_value, "Lançamento avulso registrado");
        Ok(saved)
    }
}

pub fn csv_file_name(today: NaiveDate) -> String {
    format!("historico_lancamentos_{}.csv", today.format("%Y-%m-%d"))
}

// Campo com ';', aspas ou quebra de linha vai entre aspas
fn csv_field(raw: &str) -> String {
    if raw.contains(';') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Histórico em CSV para o Excel brasileiro (';' e vírgula decimal).
pub fn render_csv(entries: &[LedgerEntry]) -> String {
    let header = CSV_HEADER.map(csv_field).join(";");

    let rows = entries.iter().map(|e| {
        [
            e.date.format("%Y-%m-%d").to_string(),
            e.kind.as_str().to_string(),
            e.sale_number.clone().unwrap_or_default(),
            e.payment_method.map(|m| m.as_str().to_string()).unwrap_or_default(),
            e.product_name.clone().unwrap_or_default(),
            e.quantity.map(|q| q.to_string()).unwrap_or_default(),
            e.final_value().to_string().replace('.', ","),
        ]
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(";")
    });

    std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::PaymentMethod;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(product: &str, net: &str) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            kind: EntryKind::Venda,
            product_code: Some("A1".into()),
            product_name: Some(product.into()),
            supplier: None,
            quantity: Some(2),
            gross_value: "159.80".parse().unwrap(),
            discount: Decimal::ZERO,
            interest: Decimal::ZERO,
            net_value: net.parse().unwrap(),
            payment_method: Some(PaymentMethod::Pix),
            sale_number: Some("250307-1".into()),
            location: Some(StockLocation::Loja),
            installments: None,
            payment_start: None,
            customer: None,
            email: None,
            phone: None,
            salesperson: None,
            receivable_status: None,
            description: None,
            registered_by: "admin".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn renders_header_and_rows_with_decimal_comma() {
        let csv = render_csv(&[entry("Boné", "149.80")]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Data;Tipo;Nr Venda;Forma Pgto;Produto;Qtde;Valor Final da Venda");
        assert_eq!(lines[1], "2025-03-07;VENDA;250307-1;PIX;Boné;2;149,80");
    }

    #[test]
    fn falls_back_to_gross_when_net_is_zero() {
        let csv = render_csv(&[entry("Boné", "0")]);
        assert!(csv.ends_with(";159,80"));
    }

    #[test]
    fn quotes_fields_with_separators_or_quotes() {
        let csv = render_csv(&[entry("Coturno \"Ranger\"; preto", "10.00")]);
        assert!(csv.contains(";\"Coturno \"\"Ranger\"\"; preto\";"));

        assert_eq!(csv_field("linha\nquebrada"), "\"linha\nquebrada\"");
        assert_eq!(csv_field("simples"), "simples");
    }

    #[test]
    fn empty_history_is_just_the_header() {
        assert_eq!(render_csv(&[]).lines().count(), 1);
    }

    #[test]
    fn file_name_carries_the_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(csv_file_name(today), "historico_lancamentos_2025-03-07.csv");
    }
}
