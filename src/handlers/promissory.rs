// src/handlers/promissory.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::products::today,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::promissory::{
        CollectionReport, PaymentReceipt, PromissoryListing, PromissoryNoteView, PromissoryPayment,
        SettlementMethod,
    },
    services::promissory_service::PaymentRequest,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Somente promissórias com parcelas vencidas
    #[serde(default)]
    pub only_overdue: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub selected: bool,
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor pago deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentPayload {
    #[validate(length(min = 1, message = "Informe o número da venda."))]
    pub sale_number: String,

    pub payment_date: Option<NaiveDate>,

    pub method: SettlementMethod,

    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/promissory-notes",
    tag = "Promissory",
    params(ListingQuery),
    responses(
        (status = 200, description = "Promissórias com atraso calculado e consolidação por cliente", body = PromissoryListing)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_notes(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = app_state
        .promissory_service
        .listing(today(), query.only_overdue)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(listing)))
}

#[utoipa::path(
    get,
    path = "/api/promissory-notes/report.pdf",
    tag = "Promissory",
    params(ListingQuery),
    responses(
        (status = 200, description = "Relatório de promissórias em PDF", content_type = "application/pdf")
    ),
    security(("api_jwt" = []))
)]
pub async fn notes_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListingQuery>,
) -> Result<Response, ApiError> {
    let listing = app_state
        .promissory_service
        .listing(today(), query.only_overdue)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .promissory_pdf(&listing, query.only_overdue)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let disposition = format!(
        "attachment; filename=\"promissorias_{}.pdf\"",
        listing.today.format("%Y-%m-%d")
    );
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, pdf_bytes).into_response())
}

#[utoipa::path(
    patch,
    path = "/api/promissory-notes/{id}/selection",
    tag = "Promissory",
    request_body = SelectionPayload,
    params(("id" = Uuid, Path, description = "ID da promissória")),
    responses(
        (status = 200, description = "Seleção atualizada", body = PromissoryNoteView),
        (status = 404, description = "Promissória não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_selection(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<SelectionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .promissory_service
        .set_selection(note_id, payload.selected, today())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

#[utoipa::path(
    post,
    path = "/api/promissory-notes/collections",
    tag = "Promissory",
    responses(
        (status = 200, description = "Cobranças enviadas às promissórias selecionadas", body = CollectionReport),
        (status = 500, description = "E-mail não configurado ou falha no envio")
    ),
    security(("api_jwt" = []))
)]
pub async fn send_collections(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .collection_service
        .send_to_selected()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/promissory-payments",
    tag = "Promissory",
    responses(
        (status = 200, description = "Pagamentos registrados", body = Vec<PromissoryPayment>),
        (status = 403, description = "Apenas o administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .promissory_service
        .list_payments()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    post,
    path = "/api/promissory-payments",
    tag = "Promissory",
    request_body = RegisterPaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado e saldo reconciliado", body = PaymentReceipt),
        (status = 404, description = "Promissória não encontrada"),
        (status = 403, description = "Apenas o administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<RegisterPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = PaymentRequest {
        sale_number: payload.sale_number.trim().to_string(),
        payment_date: payload.payment_date.unwrap_or_else(today),
        method: payload.method,
        amount: payload.amount,
    };

    let receipt = app_state
        .promissory_service
        .register_payment(&app_state.db_pool, &request)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_must_be_positive() {
        let payload: RegisterPaymentPayload =
            serde_json::from_str(r#"{"saleNumber":"250307-1","method":"PIX","amount":0}"#).unwrap();
        assert!(payload.validate().is_err());

        let payload: RegisterPaymentPayload = serde_json::from_str(
            r#"{"saleNumber":"250307-1","method":"CARTAO_CREDITO","amount":30.0}"#,
        )
        .unwrap();
        assert_eq!(payload.method, SettlementMethod::CartaoCredito);
        assert!(payload.validate().is_ok());
    }
}
