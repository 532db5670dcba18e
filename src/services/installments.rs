// src/services/installments.rs
//
// Regras de atraso, status e saldo das promissórias.
// Tudo aqui é puro: recebe as datas e valores, não toca no banco.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::promissory::{NoteStatus, PromissoryNote, PromissoryNoteView};

/// Parcelas vencidas até `today`. O mês inicial já conta como uma parcela.
pub fn overdue_installments(start: NaiveDate, today: NaiveDate, total_installments: i32) -> i32 {
    if start > today {
        return 0;
    }

    let months = (today.year() - start.year()) * 12
        + (today.month() as i32 - start.month() as i32)
        + 1;

    months.clamp(0, total_installments.max(0))
}

pub fn note_status(balance: Decimal, overdue: i32) -> NoteStatus {
    if balance <= Decimal::ZERO {
        NoteStatus::Quitado
    } else if overdue > 0 {
        NoteStatus::Pendente
    } else {
        NoteStatus::Aberto
    }
}

/// Visão calculada de uma promissória para a data informada.
pub fn view_of(note: PromissoryNote, today: NaiveDate) -> PromissoryNoteView {
    let overdue = overdue_installments(note.start_date, today, note.installments);
    let computed_status = note_status(note.balance, overdue);
    PromissoryNoteView {
        note,
        overdue_installments: overdue,
        computed_status,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub prior_balance: Decimal,
    pub resulting_balance: Decimal,
}

impl Reconciliation {
    pub fn is_settled(&self) -> bool {
        self.resulting_balance.is_zero()
    }
}

/// Saldo antes e depois de um pagamento, nunca negativo.
pub fn reconcile(original_value: Decimal, already_paid: Decimal, amount: Decimal) -> Reconciliation {
    let prior_balance = (original_value - already_paid).max(Decimal::ZERO);
    let resulting_balance = (prior_balance - amount).max(Decimal::ZERO);
    Reconciliation { prior_balance, resulting_balance }
}

/// O que o pagamento faz com a promissória.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    // Sai da carteira e a venda vira RECEBIDO
    Settled,
    // Continua aberta com saldo, atraso e status recalculados
    Outstanding {
        balance: Decimal,
        overdue: i32,
        status: NoteStatus,
    },
}

pub fn payment_outcome(reconciliation: &Reconciliation, overdue: i32) -> PaymentOutcome {
    if reconciliation.is_settled() {
        PaymentOutcome::Settled
    } else {
        let balance = reconciliation.resulting_balance;
        PaymentOutcome::Outstanding {
            balance,
            overdue,
            status: note_status(balance, overdue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn note(balance: &str, start: NaiveDate, installments: i32) -> PromissoryNote {
        PromissoryNote {
            id: Uuid::new_v4(),
            sale_number: "250105-1".into(),
            customer: "João".into(),
            email: None,
            phone: None,
            value: dec("300.00"),
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

    #[test]
    fn future_start_has_nothing_overdue() {
        let today = date(2025, 3, 7);
        assert_eq!(overdue_installments(date(2025, 3, 8), today, 3), 0);
        assert_eq!(overdue_installments(date(2026, 1, 5), today, 12), 0);
    }

    #[test]
    fn starting_month_counts_as_one_installment() {
        assert_eq!(overdue_installments(date(2025, 3, 5), date(2025, 3, 5), 3), 1);
        assert_eq!(overdue_installments(date(2025, 3, 5), date(2025, 3, 31), 3), 1);
        assert_eq!(overdue_installments(date(2025, 1, 5), date(2025, 3, 1), 3), 3);
    }

    #[test]
    fn counts_across_year_boundaries() {
        assert_eq!(overdue_installments(date(2024, 11, 5), date(2025, 1, 10), 10), 3);
    }

    #[test]
    fn never_exceeds_the_installment_count() {
        assert_eq!(overdue_installments(date(2020, 1, 5), date(2025, 3, 7), 4), 4);
        assert_eq!(overdue_installments(date(2020, 1, 5), date(2025, 3, 7), 0), 0);
    }

    #[test]
    fn overdue_never_decreases_as_months_pass() {
        let start = date(2024, 10, 5);
        let mut today = date(2024, 8, 1);
        let mut last = 0;
        for _ in 0..24 {
            let current = overdue_installments(start, today, 6);
            assert!(current >= last, "caiu de {} para {} em {}", last, current, today);
            assert!(current <= 6);
            last = current;
            today = today.checked_add_months(chrono::Months::new(1)).unwrap();
        }
        assert_eq!(last, 6);
    }

    #[test]
    fn non_positive_balance_is_always_settled() {
        assert_eq!(note_status(Decimal::ZERO, 5), NoteStatus::Quitado);
        assert_eq!(note_status(dec("-1.00"), 0), NoteStatus::Quitado);
        assert_eq!(note_status(dec("10.00"), 2), NoteStatus::Pendente);
        assert_eq!(note_status(dec("10.00"), 0), NoteStatus::Aberto);
    }

    #[test]
    fn view_recomputes_status_for_today() {
        let today = Utc::now().date_naive();
        let view = view_of(note("120.00", today - Duration::days(70), 3), today);
        assert!(view.overdue_installments >= 2);
        assert_eq!(view.computed_status, NoteStatus::Pendente);

        let paid = view_of(note("0", today - Duration::days(70), 3), today);
        assert_eq!(paid.computed_status, NoteStatus::Quitado);
    }

    #[test]
    fn partial_payment_reduces_the_balance() {
        let r = reconcile(dec("300.00"), dec("100.00"), dec("50.00"));
        assert_eq!(r.prior_balance, dec("200.00"));
        assert_eq!(r.resulting_balance, dec("150.00"));
        assert!(!r.is_settled());
    }

    #[test]
    fn overpayment_floors_at_zero_and_settles() {
        let r = reconcile(dec("300.00"), dec("250.00"), dec("80.00"));
        assert_eq!(r.prior_balance, dec("50.00"));
        assert_eq!(r.resulting_balance, Decimal::ZERO);
        assert!(r.is_settled());

        let already = reconcile(dec("300.00"), dec("400.00"), dec("10.00"));
        assert_eq!(already.prior_balance, Decimal::ZERO);
        assert_eq!(already.resulting_balance, Decimal::ZERO);
    }

    #[test]
    fn full_payment_settles_the_note() {
        let r = reconcile(dec("100.00"), Decimal::ZERO, dec("100.00"));
        assert_eq!(payment_outcome(&r, 2), PaymentOutcome::Settled);

        let over = reconcile(dec("100.00"), dec("60.00"), dec("70.00"));
        assert_eq!(payment_outcome(&over, 0), PaymentOutcome::Settled);
    }

    #[test]
    fn partial_payment_keeps_balance_overdue_and_status() {
        let late = reconcile(dec("300.00"), dec("100.00"), dec("50.00"));
        assert_eq!(
            payment_outcome(&late, 2),
            PaymentOutcome::Outstanding {
                balance: dec("150.00"),
                overdue: 2,
                status: NoteStatus::Pendente,
            }
        );

        let on_time = reconcile(dec("300.00"), Decimal::ZERO, dec("50.00"));
        assert_eq!(
            payment_outcome(&on_time, 0),
            PaymentOutcome::Outstanding {
                balance: dec("250.00"),
                overdue: 0,
                status: NoteStatus::Aberto,
            }
        );
    }
}
