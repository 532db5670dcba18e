// src/handlers/ledger.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::products::{today, validate_not_negative},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{BackOffice, RequireRole},
    },
    models::ledger::{EntryKind, HistoryFilter, LedgerEntry, PaymentMethod},
    services::ledger_service::{csv_file_name, ManualEntryRequest},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Data inicial (inclusive)
    pub from: Option<NaiveDate>,
    /// Data final (inclusive)
    pub to: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

impl From<HistoryQuery> for HistoryFilter {
    fn from(query: HistoryQuery) -> Self {
        HistoryFilter {
            from: query.from,
            to: query.to,
            payment_method: query.payment_method,
        }
    }
}

// Só despesas e doações entram por aqui
fn validate_manual_kind(kind: &EntryKind) -> Result<(), ValidationError> {
    match kind {
        EntryKind::Despesa | EntryKind::Doacao => Ok(()),
        _ => {
            let mut err = ValidationError::new("kind");
            err.message = Some("Lançamento avulso deve ser DESPESA ou DOACAO.".into());
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryPayload {
    #[validate(custom(function = "validate_manual_kind"))]
    pub kind: EntryKind,

    pub date: Option<NaiveDate>,

    #[validate(custom(function = "validate_not_negative"))]
    pub value: Decimal,

    pub description: Option<String>,

    // Doação de mercadoria: baixa da loja
    pub product_code: Option<String>,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/ledger",
    tag = "Ledger",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Histórico de lançamentos", body = Vec<LedgerEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = HistoryFilter::from(query);
    let entries = app_state
        .ledger_service
        .history(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

#[utoipa::path(
    get,
    path = "/api/ledger/export.csv",
    tag = "Ledger",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Histórico filtrado em CSV", content_type = "text/csv")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let filter = HistoryFilter::from(query);
    let csv = app_state
        .ledger_service
        .export_csv(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", csv_file_name(today())),
        ),
    ];

    Ok((headers, csv).into_response())
}

#[utoipa::path(
    post,
    path = "/api/ledger/entries",
    tag = "Ledger",
    request_body = ManualEntryPayload,
    responses(
        (status = 201, description = "Lançamento registrado", body = LedgerEntry),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administrador ou gerente")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<BackOffice>,
    Json(payload): Json<ManualEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = ManualEntryRequest {
        kind: payload.kind,
        date: payload.date.unwrap_or_else(today),
        value: payload.value,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        product_code: payload.product_code.filter(|c| !c.trim().is_empty()),
        quantity: payload.quantity,
    };

    let entry = app_state
        .ledger_service
        .record_manual_entry(&app_state.db_pool, &request, user.display_name())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_expenses_and_donations_are_manual() {
        let expense: ManualEntryPayload =
            serde_json::from_str(r#"{"kind":"DESPESA","value":120.5,"description":"Aluguel"}"#).unwrap();
        assert!(expense.validate().is_ok());

        let sale: ManualEntryPayload = serde_json::from_str(r#"{"kind":"VENDA","value":10}"#).unwrap();
        let errors = sale.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("kind"));
    }

    #[test]
    fn query_maps_into_the_history_filter() {
        let query = HistoryQuery {
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            to: None,
            payment_method: Some(PaymentMethod::Pix),
        };
        let filter = HistoryFilter::from(query);
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(filter.payment_method, Some(PaymentMethod::Pix));
    }
}
