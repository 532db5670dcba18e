// src/handlers/inventory.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::products::today,
    middleware::i18n::Locale,
    models::inventory::{InventoryReport, StockLocation},
};

// Filtro de local da tela de inventário
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationFilter {
    Loja,
    Deposito,
    #[default]
    Todos,
}

impl LocationFilter {
    pub fn scope(self) -> Option<StockLocation> {
        match self {
            LocationFilter::Loja => Some(StockLocation::Loja),
            LocationFilter::Deposito => Some(StockLocation::Deposito),
            LocationFilter::Todos => None,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryQuery {
    /// Data base (padrão: hoje)
    pub date: Option<NaiveDate>,
    /// LOJA, DEPOSITO ou TODOS
    #[serde(default)]
    pub location: LocationFilter,
}

async fn load_report(app_state: &AppState, locale: &Locale, query: &InventoryQuery) -> Result<InventoryReport, ApiError> {
    let as_of = query.date.unwrap_or_else(today);
    app_state
        .inventory_service
        .inventory(as_of, query.location.scope())
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "Inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Saldo por produto e local na data base", body = InventoryReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = load_report(&app_state, &locale, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/report.pdf",
    tag = "Inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Relatório de inventário em PDF", content_type = "application/pdf"),
        (status = 500, description = "Fonte do PDF não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn inventory_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<InventoryQuery>,
) -> Result<Response, ApiError> {
    let report = load_report(&app_state, &locale, &query).await?;

    let pdf_bytes = app_state
        .document_service
        .inventory_pdf(&report)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let disposition = format!(
        "attachment; filename=\"inventario_{}.pdf\"",
        report.as_of.format("%Y-%m-%d")
    );
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, pdf_bytes).into_response())
}
