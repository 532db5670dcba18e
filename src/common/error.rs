// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Taxonomia única de erros da aplicação.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Login já existe")]
    LoginAlreadyExists,

    #[error("Usuário não pode excluir a si mesmo")]
    CannotDeleteSelf,

    #[error("Produto não encontrado: {0}")]
    ProductNotFound(String),

    #[error("Produto sem valor unitário: {0}")]
    MissingUnitPrice(String),

    #[error("Estoque insuficiente em {location}: disponível {available}, pedido {requested}")]
    InsufficientStock {
        location: String,
        available: i64,
        requested: i32,
    },

    #[error("Número de venda já usado: {0}")]
    SaleNumberAlreadyExists(String),

    #[error("Promissória não encontrada: {0}")]
    PromissoryNoteNotFound(String),

    #[error("Destinatário de e-mail não informado")]
    MissingRecipient,

    #[error("Envio de e-mail não configurado")]
    MailNotConfigured,

    #[error("Falha no envio de e-mail: {0}")]
    MailDeliveryFailed(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O formato de erro que vai para o cliente.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::MissingRecipient => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound
            | AppError::ProductNotFound(_)
            | AppError::PromissoryNoteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginAlreadyExists
            | AppError::CannotDeleteSelf
            | AppError::InsufficientStock { .. }
            | AppError::SaleNumberAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::MissingUnitPrice(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave do catálogo de mensagens
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::LoginAlreadyExists => "login_already_exists",
            AppError::CannotDeleteSelf => "cannot_delete_self",
            AppError::ProductNotFound(_) => "product_not_found",
            AppError::MissingUnitPrice(_) => "missing_unit_price",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::SaleNumberAlreadyExists(_) => "sale_number_already_exists",
            AppError::PromissoryNoteNotFound(_) => "promissory_note_not_found",
            AppError::MissingRecipient => "missing_recipient",
            AppError::MailNotConfigured => "mail_not_configured",
            AppError::MailDeliveryFailed(_) => "mail_delivery_failed",
            AppError::FontNotFound(_) => "font_not_found",
            _ => "internal",
        }
    }

    fn message_params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::ProductNotFound(code) | AppError::MissingUnitPrice(code) => {
                vec![("code", code.clone())]
            }
            AppError::PromissoryNoteNotFound(sale_number)
            | AppError::SaleNumberAlreadyExists(sale_number) => {
                vec![("saleNumber", sale_number.clone())]
            }
            AppError::InsufficientStock { location, available, requested } => vec![
                ("location", location.clone()),
                ("available", available.to_string()),
                ("requested", requested.to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// Converte o erro interno no formato da API, no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let message = store.message(&locale.0, self.message_key(), &self.message_params());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError {
            status,
            error: message,
            details,
        }
    }
}

// Usado pelo middleware, que ainda não conhece o idioma do cliente.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::fallback())
            .into_response()
    }
}
