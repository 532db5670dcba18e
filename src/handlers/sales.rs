// src/handlers/sales.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::products::{today, validate_not_negative},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::ledger::{PaymentMethod, SaleReceipt},
    services::sales_service::SaleRequest,
};

// ---
// Payload: venda no balcão
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSalePayload {
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Preencha o código do produto."))]
    #[schema(example = "CAM-001")]
    pub product_code: String,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub interest: Decimal,

    pub payment_method: PaymentMethod,

    // Em branco, o número é gerado (AAMMDD-N)
    pub sale_number: Option<String>,

    #[validate(range(min = 1, message = "O número de parcelas deve ser maior que zero."))]
    pub installments: Option<i32>,

    pub payment_start: Option<NaiveDate>,
    pub customer: Option<String>,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub salesperson: Option<String>,

    #[serde(default)]
    pub allow_insufficient_stock: bool,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl RegisterSalePayload {
    // Venda em promissória precisa de cliente e parcelas
    fn validate_promissory(&self) -> Result<(), (&'static str, ValidationError)> {
        if self.payment_method != PaymentMethod::Promissoria {
            return Ok(());
        }
        if self.customer.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            let mut err = ValidationError::new("required");
            err.message = Some("Informe o cliente da promissória.".into());
            return Err(("customer", err));
        }
        if self.installments.is_none() {
            let mut err = ValidationError::new("required");
            err.message = Some("Informe o número de parcelas.".into());
            return Err(("installments", err));
        }
        Ok(())
    }

    fn into_request(self) -> SaleRequest {
        SaleRequest {
            date: self.date.unwrap_or_else(today),
            product_code: self.product_code,
            quantity: self.quantity,
            discount: self.discount,
            interest: self.interest,
            payment_method: self.payment_method,
            sale_number: blank_to_none(self.sale_number),
            installments: self.installments,
            payment_start: self.payment_start,
            customer: blank_to_none(self.customer),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
            salesperson: blank_to_none(self.salesperson),
            allow_insufficient_stock: self.allow_insufficient_stock,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = RegisterSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = SaleReceipt),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Estoque insuficiente na loja ou Nr Venda já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RegisterSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    payload.validate_promissory().map_err(|(field, e)| {
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, e);
        AppError::ValidationError(errors).to_api_error(&locale, &app_state.i18n_store)
    })?;

    let request = payload.into_request();
    let receipt = app_state
        .sales_service
        .register_sale(&app_state.db_pool, &request, user.display_name())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> RegisterSalePayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn promissory_sale_needs_customer_and_installments() {
        let sale = payload(r#"{"productCode":"CAM-001","quantity":1,"paymentMethod":"PROMISSORIA"}"#);
        assert_eq!(sale.validate_promissory().unwrap_err().0, "customer");

        let sale = payload(
            r#"{"productCode":"CAM-001","quantity":1,"paymentMethod":"PROMISSORIA","customer":"Maria"}"#,
        );
        assert_eq!(sale.validate_promissory().unwrap_err().0, "installments");

        let sale = payload(
            r#"{"productCode":"CAM-001","quantity":1,"paymentMethod":"PROMISSORIA","customer":"Maria","installments":3}"#,
        );
        assert!(sale.validate_promissory().is_ok());
    }

    #[test]
    fn cash_sale_needs_no_customer() {
        let sale = payload(r#"{"productCode":"CAM-001","quantity":2,"paymentMethod":"DINHEIRO"}"#);
        assert!(sale.validate().is_ok());
        assert!(sale.validate_promissory().is_ok());
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let sale = payload(
            r#"{"productCode":"CAM-001","quantity":1,"paymentMethod":"PIX","saleNumber":"  ","customer":" Ana "}"#,
        );
        let request = sale.into_request();
        assert_eq!(request.sale_number, None);
        assert_eq!(request.customer.as_deref(), Some("Ana"));
        assert_eq!(request.discount, Decimal::ZERO);
    }
}
