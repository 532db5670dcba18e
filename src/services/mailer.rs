// src/services/mailer.rs

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};

use crate::{common::error::AppError, config::MailSettings};

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

// Ponto de troca do envio (SMTP em produção, gravação em memória nos testes)
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

// Relay SMTP com a conta da loja
pub struct SmtpMailer {
    settings: MailSettings,
}

impl SmtpMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    fn build_message(&self, from: &str, email: &OutgoingEmail) -> Result<Message, AppError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.settings.store_name, from)
            .parse()
            .map_err(|_| AppError::MailNotConfigured)?;
        let to_mailbox: Mailbox = email
            .to
            .trim()
            .parse()
            .map_err(|e| AppError::MailDeliveryFailed(format!("Destinatário inválido: {e}")))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| AppError::MailDeliveryFailed(format!("Falha ao montar e-mail: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        if email.to.trim().is_empty() {
            return Err(AppError::MissingRecipient);
        }

        let (user, password) = self
            .settings
            .credentials()
            .ok_or(AppError::MailNotConfigured)?;

        let message = self.build_message(user, email)?;
        let host = self.settings.smtp_host.clone();
        let credentials = Credentials::new(user.to_string(), password.to_string());

        // O transporte do lettre é bloqueante
        tokio::task::spawn_blocking(move || {
            let transport = SmtpTransport::relay(&host)
                .map_err(|e| AppError::MailDeliveryFailed(format!("Host SMTP inválido: {e}")))?
                .credentials(credentials)
                .build();
            transport.send(&message).map_err(|e| {
                tracing::error!("Falha no envio SMTP: {}", e);
                AppError::MailDeliveryFailed(e.to_string())
            })?;
            Ok::<(), AppError>(())
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de envio de e-mail: {}", e))??;

        tracing::info!(to = %email.to.trim(), subject = %email.subject, "E-mail enviado");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Guarda os e-mails em memória; falha para os endereços listados
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
        pub failing: Vec<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
            if self.failing.contains(&email.to) {
                return Err(AppError::MailDeliveryFailed("recusado".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn settings(user: Option<&str>) -> MailSettings {
        MailSettings {
            smtp_host: "smtp.gmail.com".into(),
            user: user.map(String::from),
            password: user.map(|_| "senha".to_string()),
            store_name: "Wolf Artigos Militares".into(),
        }
    }

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.into(),
            subject: "Assunto".into(),
            body: "Corpo".into(),
        }
    }

    #[tokio::test]
    async fn empty_recipient_is_rejected_before_anything_else() {
        let mailer = SmtpMailer::new(settings(None));
        let result = mailer.send(&email("  ")).await;
        assert!(matches!(result, Err(AppError::MissingRecipient)));
    }

    #[tokio::test]
    async fn missing_credentials_mean_not_configured() {
        let mailer = SmtpMailer::new(settings(None));
        let result = mailer.send(&email("cliente@exemplo.com")).await;
        assert!(matches!(result, Err(AppError::MailNotConfigured)));
    }

    #[test]
    fn builds_a_plain_text_message_from_the_store_account() {
        let mailer = SmtpMailer::new(settings(Some("loja@exemplo.com")));
        let message = mailer.build_message("loja@exemplo.com", &email("cliente@exemplo.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("cliente@exemplo.com"));
        assert!(raw.contains("loja@exemplo.com"));
        assert!(raw.contains("Subject: Assunto"));
    }

    #[test]
    fn invalid_recipient_fails_delivery() {
        let mailer = SmtpMailer::new(settings(Some("loja@exemplo.com")));
        let result = mailer.build_message("loja@exemplo.com", &email("não é e-mail"));
        assert!(matches!(result, Err(AppError::MailDeliveryFailed(_))));
    }
}
