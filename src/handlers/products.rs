// src/handlers/products.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{BackOffice, RequireRole},
    },
    models::inventory::{Product, PurchaseKind, PurchaseResult},
    services::inventory_service::{ProductInput, PurchaseRequest},
};

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ---
// Payload: cadastro/edição de produto (upsert pelo código)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductPayload {
    #[validate(length(min = 1, message = "Preencha o código do produto."))]
    #[schema(example = "CAM-001")]
    pub code: String,

    #[validate(length(min = 1, message = "Preencha o nome do produto."))]
    #[schema(example = "Camiseta Camuflada")]
    pub name: String,

    #[serde(default)]
    pub supplier: String,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    #[serde(default)]
    pub minimum_stock: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub unit_price: Decimal,

    pub photo_url: Option<String>,
}

// ---
// Payload: compra (entra no depósito) ou reposição (depósito -> loja)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    pub kind: PurchaseKind,

    // Sem data, vale o dia de hoje
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Preencha o código do produto."))]
    pub product_code: String,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    #[serde(default)]
    pub allow_insufficient_stock: bool,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Produtos cadastrados", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = SaveProductPayload,
    responses(
        (status = 200, description = "Produto salvo", body = Product),
        (status = 403, description = "Apenas administrador ou gerente")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<BackOffice>,
    Json(payload): Json<SaveProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = ProductInput {
        code: payload.code.trim().to_string(),
        name: payload.name.trim().to_string(),
        supplier: payload.supplier.trim().to_string(),
        minimum_stock: payload.minimum_stock,
        unit_price: payload.unit_price,
        photo_url: payload.photo_url.filter(|url| !url.trim().is_empty()),
    };

    let product = app_state
        .inventory_service
        .save_product(&app_state.db_pool, &input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    post,
    path = "/api/products/purchases",
    tag = "Products",
    request_body = PurchasePayload,
    responses(
        (status = 201, description = "Movimentação registrada", body = PurchaseResult),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Estoque insuficiente no depósito"),
        (status = 422, description = "Produto sem valor unitário")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<BackOffice>,
    Json(payload): Json<PurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let request = PurchaseRequest {
        kind: payload.kind,
        date: payload.date.unwrap_or_else(today),
        product_code: payload.product_code,
        quantity: payload.quantity,
        allow_insufficient_stock: payload.allow_insufficient_stock,
    };

    let result = app_state
        .inventory_service
        .register_purchase(&app_state.db_pool, &request, user.display_name())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}
