// src/services/promissory_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LedgerRepository, PromissoryRepository},
    models::promissory::{
        CustomerConsolidation, NewPromissoryPayment, NoteStatus, PaymentReceipt, PromissoryListing,
        PromissoryNote, PromissoryNoteView, PromissoryPayment, SettlementMethod,
    },
    services::installments::{self, overdue_installments, payment_outcome, reconcile, PaymentOutcome},
};

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub sale_number: String,
    pub payment_date: NaiveDate,
    pub method: SettlementMethod,
    pub amount: Decimal,
}

#[derive(Clone)]
pub struct PromissoryService {
    promissory_repo: PromissoryRepository,
    ledger_repo: LedgerRepository,
}

impl PromissoryService {
    pub fn new(promissory_repo: PromissoryRepository, ledger_repo: LedgerRepository) -> Self {
        Self { promissory_repo, ledger_repo }
    }

    pub async fn listing(&self, today: NaiveDate, only_overdue: bool) -> Result<PromissoryListing, AppError> {
        let notes = self.promissory_repo.list_notes().await?;
        Ok(build_listing(notes, today, only_overdue))
    }

    pub async fn set_selection(
        &self,
        id: Uuid,
        selected: bool,
        today: NaiveDate,
    ) -> Result<PromissoryNoteView, AppError> {
        let note = self
            .promissory_repo
            .set_selected(id, selected)
            .await?
            .ok_or_else(|| AppError::PromissoryNoteNotFound(id.to_string()))?;
        Ok(installments::view_of(note, today))
    }

    pub async fn list_payments(&self) -> Result<Vec<PromissoryPayment>, AppError> {
        self.promissory_repo.list_payments().await
    }

    // Registra o pagamento e reconcilia o saldo numa única transação
    pub async fn register_payment<'e, E>(
        &self,
        executor: E,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let note = self
            .promissory_repo
            .find_for_update(&mut *tx, &request.sale_number)
            .await?
            .ok_or_else(|| AppError::PromissoryNoteNotFound(request.sale_number.trim().to_string()))?;

        let already_paid = self.promissory_repo.total_paid(&mut *tx, note.id).await?;
        let reconciliation = reconcile(note.value, already_paid, request.amount);
        let overdue = overdue_installments(note.start_date, request.payment_date, note.installments);

        let payment = self
            .promissory_repo
            .insert_payment(
                &mut *tx,
                &NewPromissoryPayment {
                    note_id: note.id,
                    payment_date: request.payment_date,
                    sale_number: note.sale_number.clone(),
                    method: request.method,
                    overdue_installments: overdue,
                    customer: note.customer.clone(),
                    prior_balance: reconciliation.prior_balance,
                    amount_paid: request.amount,
                    resulting_balance: reconciliation.resulting_balance,
                },
            )
            .await?;

        let outcome = payment_outcome(&reconciliation, overdue);
        match outcome {
            PaymentOutcome::Settled => {
                self.promissory_repo.delete_note(&mut *tx, note.id).await?;
                self.ledger_repo.mark_received(&mut *tx, &note.sale_number).await?;
            }
            PaymentOutcome::Outstanding { balance, overdue, status } => {
                self.promissory_repo
                    .update_balance(&mut *tx, note.id, balance, overdue, status)
                    .await?;
            }
        }
        let settled = outcome == PaymentOutcome::Settled;

        tx.commit().await?;

        tracing::info!(
            sale_number = %note.sale_number,
            amount = %request.amount,
            prior_balance = %reconciliation.prior_balance,
            resulting_balance = %reconciliation.resulting_balance,
            settled,
            "Pagamento de promissória registrado"
        );

        Ok(PaymentReceipt { payment, settled })
    }
}

/// Visões calculadas sem as quitadas, opcionalmente só as atrasadas.
pub fn build_listing(notes: Vec<PromissoryNote>, today: NaiveDate, only_overdue: bool) -> PromissoryListing {
    let notes: Vec<PromissoryNoteView> = notes
        .into_iter()
        .map(|note| installments::view_of(note, today))
        .filter(|view| view.computed_status != NoteStatus::Quitado)
        .filter(|view| !only_overdue || view.overdue_installments > 0)
        .collect();

    let by_customer = consolidate(&notes);

    PromissoryListing { today, notes, by_customer }
}

// Soma por cliente, na ordem em que aparecem
pub fn consolidate(views: &[PromissoryNoteView]) -> Vec<CustomerConsolidation> {
    let mut result: Vec<CustomerConsolidation> = Vec::new();
    for view in views {
        match result.iter_mut().find(|c| c.customer == view.note.customer) {
            Some(existing) => {
                existing.total_balance += view.note.balance;
                existing.overdue_installments += view.overdue_installments as i64;
                if existing.email.is_none() {
                    existing.email = view.note.email.clone();
                }
            }
            None => result.push(CustomerConsolidation {
                customer: view.note.customer.clone(),
                email: view.note.email.clone(),
                total_balance: view.note.balance,
                overdue_installments: view.overdue_installments as i64,
            }),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn note(sale: &str, customer: &str, balance: &str, start: NaiveDate, installments: i32) -> PromissoryNote {
        PromissoryNote {
            id: Uuid::new_v4(),
            sale_number: sale.into(),
            customer: customer.into(),
            email: Some(format!("{}@exemplo.com", customer.to_lowercase())),
            phone: None,
            value: dec(balance),
            balance: dec(balance),
            start_date: start,
            installments,
            overdue_snapshot: 0,
            status: NoteStatus::Aberto,
            selected: false,
            email_enviado: false,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<PromissoryNote> {
        vec![
            note("250105-1", "Ana", "100.00", date(2025, 1, 5), 3),
            note("250405-1", "Ana", "50.00", date(2025, 4, 5), 2),
            note("250110-2", "Bruno", "0", date(2025, 1, 10), 1),
            note("250201-1", "Carla", "80.00", date(2025, 2, 1), 4),
        ]
    }

    #[test]
    fn settled_notes_are_hidden() {
        let listing = build_listing(sample(), date(2025, 3, 7), false);
        assert_eq!(listing.notes.len(), 3);
        assert!(listing.notes.iter().all(|v| v.note.customer != "Bruno"));
    }

    #[test]
    fn overdue_filter_keeps_only_late_notes() {
        let listing = build_listing(sample(), date(2025, 3, 7), true);
        let sales: Vec<&str> = listing.notes.iter().map(|v| v.note.sale_number.as_str()).collect();
        assert_eq!(sales, vec!["250105-1", "250201-1"]);
        assert!(listing.notes.iter().all(|v| v.computed_status == NoteStatus::Pendente));
    }

    #[test]
    fn consolidation_sums_per_customer() {
        let listing = build_listing(sample(), date(2025, 3, 7), false);

        assert_eq!(listing.by_customer.len(), 2);
        let ana = &listing.by_customer[0];
        assert_eq!(ana.customer, "Ana");
        assert_eq!(ana.total_balance, dec("150.00"));
        assert_eq!(ana.overdue_installments, 3);

        let carla = &listing.by_customer[1];
        assert_eq!(carla.overdue_installments, 2);
    }

    #[test]
    fn consolidation_follows_the_filter() {
        let listing = build_listing(sample(), date(2025, 3, 7), true);
        let ana = &listing.by_customer[0];
        assert_eq!(ana.total_balance, dec("100.00"));
    }
}

// Rodam contra um Postgres de verdade: DATABASE_URL=... cargo test -- --ignored
#[cfg(test)]
mod pg_tests {
    use super::*;
    use sqlx::PgPool;

    use crate::models::{
        ledger::{EntryKind, HistoryFilter, NewLedgerEntry, PaymentMethod, ReceivableStatus},
        promissory::NewPromissoryNote,
    };

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(pool: &PgPool) -> PromissoryService {
        PromissoryService::new(
            PromissoryRepository::new(pool.clone()),
            LedgerRepository::new(pool.clone()),
        )
    }

    // Venda a prazo já gravada: lançamento PENDENTE + promissória
    async fn open_note(pool: &PgPool, sale_number: &str, value: &str, start: NaiveDate, installments: i32) {
        let entry = NewLedgerEntry {
            gross_value: dec(value),
            net_value: dec(value),
            payment_method: Some(PaymentMethod::Promissoria),
            sale_number: Some(sale_number.into()),
            customer: Some("Maria".into()),
            receivable_status: Some(ReceivableStatus::Pendente),
            ..NewLedgerEntry::blank(EntryKind::Venda, date(2025, 1, 2), "caixa")
        };
        LedgerRepository::new(pool.clone()).insert(pool, &entry).await.unwrap();
        note_only(pool, sale_number, value, start, installments).await;
    }

    async fn note_only(pool: &PgPool, sale_number: &str, value: &str, start: NaiveDate, installments: i32) {
        PromissoryRepository::new(pool.clone())
            .insert_note(
                pool,
                &NewPromissoryNote {
                    sale_number: sale_number.into(),
                    customer: "Maria".into(),
                    email: None,
                    phone: None,
                    value: dec(value),
                    start_date: start,
                    installments,
                },
            )
            .await
            .unwrap();
    }

    fn payment(sale_number: &str, on: NaiveDate, amount: &str) -> PaymentRequest {
        PaymentRequest {
            sale_number: sale_number.into(),
            payment_date: on,
            method: SettlementMethod::Pix,
            amount: dec(amount),
        }
    }

    async fn sale_status(pool: &PgPool, sale_number: &str) -> Option<ReceivableStatus> {
        LedgerRepository::new(pool.clone())
            .list(&HistoryFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.sale_number.as_deref() == Some(sale_number))
            .and_then(|e| e.receivable_status)
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn partial_payment_persists_balance_overdue_and_status(pool: PgPool) {
        open_note(&pool, "250102-1", "300.00", date(2025, 1, 5), 3).await;

        let receipt = service(&pool)
            .register_payment(&pool, &payment("250102-1", date(2025, 3, 7), "50.00"))
            .await
            .unwrap();

        assert!(!receipt.settled);
        assert_eq!(receipt.payment.prior_balance, dec("300.00"));
        assert_eq!(receipt.payment.resulting_balance, dec("250.00"));
        assert_eq!(receipt.payment.overdue_installments, 3);

        let note = PromissoryRepository::new(pool.clone())
            .find_for_update(&pool, "250102-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.balance, dec("250.00"));
        assert_eq!(note.overdue_snapshot, 3);
        assert_eq!(note.status, NoteStatus::Pendente);
        assert_eq!(sale_status(&pool, "250102-1").await, Some(ReceivableStatus::Pendente));
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn settling_payment_removes_the_note_and_receives_the_sale(pool: PgPool) {
        open_note(&pool, "250102-1", "300.00", date(2025, 1, 5), 3).await;
        let svc = service(&pool);

        svc.register_payment(&pool, &payment("250102-1", date(2025, 2, 1), "100.00"))
            .await
            .unwrap();
        let receipt = svc
            .register_payment(&pool, &payment("250102-1", date(2025, 3, 1), "250.00"))
            .await
            .unwrap();

        assert!(receipt.settled);
        assert_eq!(receipt.payment.prior_balance, dec("200.00"));
        assert_eq!(receipt.payment.resulting_balance, Decimal::ZERO);

        let gone = PromissoryRepository::new(pool.clone())
            .find_for_update(&pool, "250102-1")
            .await
            .unwrap();
        assert!(gone.is_none());
        assert_eq!(sale_status(&pool, "250102-1").await, Some(ReceivableStatus::Recebido));
        assert_eq!(svc.list_payments().await.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn payments_of_a_settled_note_do_not_reduce_a_new_one(pool: PgPool) {
        let svc = service(&pool);

        note_only(&pool, "X", "100.00", date(2025, 1, 5), 1).await;
        let first = svc
            .register_payment(&pool, &payment("X", date(2025, 1, 10), "100.00"))
            .await
            .unwrap();
        assert!(first.settled);

        note_only(&pool, "X", "200.00", date(2025, 2, 5), 2).await;
        let second = svc
            .register_payment(&pool, &payment("X", date(2025, 2, 10), "50.00"))
            .await
            .unwrap();

        assert_eq!(second.payment.prior_balance, dec("200.00"));
        assert_eq!(second.payment.resulting_balance, dec("150.00"));
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn unknown_sale_number_is_not_found(pool: PgPool) {
        let err = service(&pool)
            .register_payment(&pool, &payment("999999-1", date(2025, 3, 7), "10.00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PromissoryNoteNotFound(_)));
        assert!(service(&pool).list_payments().await.unwrap().is_empty());
    }
}
