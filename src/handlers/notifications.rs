// src/handlers/notifications.rs
//
// Envio avulso de e-mail pela conta da loja.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    services::mailer::OutgoingEmail,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailPayload {
    // Vazio vira erro de destinatário (400), não de validação
    #[serde(default)]
    pub recipient_email: String,

    pub subject: Option<String>,

    #[validate(length(min = 1, message = "O corpo do e-mail não pode ser vazio."))]
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendEmailResponse {
    pub ok: bool,
}

#[utoipa::path(
    post,
    path = "/api/notifications/email",
    tag = "Notifications",
    request_body = SendEmailPayload,
    responses(
        (status = 200, description = "E-mail enviado", body = SendEmailResponse),
        (status = 400, description = "Destinatário não informado"),
        (status = 500, description = "E-mail não configurado ou falha no envio")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_email(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SendEmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.recipient_email.trim().is_empty() {
        return Err(AppError::MissingRecipient.to_api_error(&locale, &app_state.i18n_store));
    }
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let subject = payload
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| app_state.collection_service.default_subject());

    let email = OutgoingEmail {
        to: payload.recipient_email.trim().to_string(),
        subject,
        body: payload.body,
    };

    app_state
        .collection_service
        .send_email(&email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(SendEmailResponse { ok: true })))
}
