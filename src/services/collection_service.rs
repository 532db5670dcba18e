// src/services/collection_service.rs
//
// Cobrança por e-mail das promissórias selecionadas.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    db::PromissoryRepository,
    models::promissory::{CollectionReport, PromissoryNote},
    services::mailer::{Mailer, OutgoingEmail},
};

pub fn collection_subject(store_name: &str) -> String {
    format!("Lembrete de pendência - {}", store_name)
}

/// Texto fixo da carta de cobrança.
pub fn collection_letter(customer: &str, purchase_date: NaiveDate, store_name: &str) -> String {
    let name = if customer.trim().is_empty() { "cliente" } else { customer.trim() };
    let date = purchase_date.format("%d/%m/%y");

    format!(
        "Bom dia Sr(a) {name},\n\
         \n\
         Somos da Equipe Financeira da {store_name}! O motivo do contato é\n\
         para lembrá-lo de entrar em contato com um de nossos funcionários e\n\
         verificar uma possível pendência com a nossa Loja, referente a compra\n\
         realizada em {date}.\n\
         \n\
         Aproveite também para verificar nossos produtos!!\n\
         \n\
         Caso já tenha realizado o pagamento da compra mencionada, favor\n\
         desconsiderar esta mensagem!\n\
         \n\
         Atenciosamente,\n\
         Equipe Financeira\n\
         {store_name}"
    )
}

fn email_for(note: &PromissoryNote, store_name: &str) -> Option<OutgoingEmail> {
    let to = note.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
    Some(OutgoingEmail {
        to: to.to_string(),
        subject: collection_subject(store_name),
        body: collection_letter(&note.customer, note.start_date, store_name),
    })
}

#[derive(Clone)]
pub struct CollectionService {
    promissory_repo: PromissoryRepository,
    mailer: Arc<dyn Mailer>,
    store_name: String,
}

impl CollectionService {
    pub fn new(promissory_repo: PromissoryRepository, mailer: Arc<dyn Mailer>, store_name: String) -> Self {
        Self { promissory_repo, mailer, store_name }
    }

    pub async fn send_to_selected(&self) -> Result<CollectionReport, AppError> {
        let selected = self.promissory_repo.list_selected().await?;

        let outcome = dispatch(&selected, self.mailer.as_ref(), &self.store_name).await;
        for id in &outcome.sent {
            self.promissory_repo.mark_email_sent(*id).await?;
        }

        match outcome.failure {
            Some(err) => Err(err),
            None => Ok(outcome.report),
        }
    }

    /// Envio avulso (rota de notificações)
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        if email.to.trim().is_empty() {
            return Err(AppError::MissingRecipient);
        }
        self.mailer.send(email).await
    }

    pub fn default_subject(&self) -> String {
        collection_subject(&self.store_name)
    }
}

pub struct DispatchOutcome {
    pub report: CollectionReport,
    pub sent: Vec<uuid::Uuid>,
    // A primeira falha interrompe o lote; o que já saiu continua em `sent`
    pub failure: Option<AppError>,
}

pub async fn dispatch(notes: &[PromissoryNote], mailer: &dyn Mailer, store_name: &str) -> DispatchOutcome {
    let mut outcome = DispatchOutcome {
        report: CollectionReport::default(),
        sent: Vec::new(),
        failure: None,
    };

    for note in notes {
        let Some(email) = email_for(note, store_name) else {
            tracing::warn!(sale_number = %note.sale_number, "Promissória sem e-mail cadastrado");
            outcome.report.skipped_without_email += 1;
            continue;
        };

        if note.email_enviado {
            outcome.report.skipped_already_sent += 1;
            continue;
        }

        if let Err(err) = mailer.send(&email).await {
            tracing::error!(sale_number = %note.sale_number, "Falha ao enviar cobrança: {}", err);
            outcome.failure = Some(err);
            break;
        }
        tracing::info!(sale_number = %note.sale_number, to = %email.to, "Cobrança enviada");
        outcome.sent.push(note.id);
        outcome.report.sent += 1;
    }

    outcome
}
