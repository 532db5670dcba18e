// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::change_password,
        handlers::users::delete_user,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_sales_chart,
        handlers::dashboard::get_top_products,
        handlers::dashboard::get_low_stock,

        // --- Products / Inventory ---
        handlers::products::list_products,
        handlers::products::save_product,
        handlers::products::register_purchase,
        handlers::inventory::get_inventory,
        handlers::inventory::inventory_pdf,

        // --- Sales / Ledger ---
        handlers::sales::register_sale,
        handlers::ledger::list_entries,
        handlers::ledger::export_csv,
        handlers::ledger::record_entry,

        // --- Promissory ---
        handlers::promissory::list_notes,
        handlers::promissory::notes_pdf,
        handlers::promissory::set_selection,
        handlers::promissory::send_collections,
        handlers::promissory::list_payments,
        handlers::promissory::register_payment,

        // --- Notifications ---
        handlers::notifications::send_email,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::SessionInfo,
            models::auth::CreateUserPayload,
            models::auth::ChangePasswordPayload,

            // --- DASHBOARD ---
            models::dashboard::DashboardSummary,
            models::dashboard::SalesChartEntry,
            models::dashboard::TopProductEntry,
            models::dashboard::LowStockEntry,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::StockLocation,
            models::inventory::StockMovement,
            models::inventory::InventoryLine,
            models::inventory::LocationTotals,
            models::inventory::InventoryReport,
            models::inventory::PurchaseKind,
            models::inventory::PurchaseResult,

            // --- Ledger ---
            models::ledger::EntryKind,
            models::ledger::PaymentMethod,
            models::ledger::ReceivableStatus,
            models::ledger::LedgerEntry,
            models::ledger::SaleReceipt,

            // --- Promissory ---
            models::promissory::NoteStatus,
            models::promissory::SettlementMethod,
            models::promissory::PromissoryNote,
            models::promissory::PromissoryNoteView,
            models::promissory::CustomerConsolidation,
            models::promissory::PromissoryListing,
            models::promissory::PromissoryPayment,
            models::promissory::PaymentReceipt,
            models::promissory::CollectionReport,

            // --- Payloads ---
            handlers::products::SaveProductPayload,
            handlers::products::PurchasePayload,
            handlers::inventory::LocationFilter,
            handlers::sales::RegisterSalePayload,
            handlers::ledger::ManualEntryPayload,
            handlers::promissory::SelectionPayload,
            handlers::promissory::RegisterPaymentPayload,
            handlers::notifications::SendEmailPayload,
            handlers::notifications::SendEmailResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Sessão e cadastro de usuários"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Products", description = "Cadastro de produtos, compras e reposições"),
        (name = "Inventory", description = "Inventário por data e local"),
        (name = "Sales", description = "Vendas no balcão"),
        (name = "Ledger", description = "Histórico de lançamentos, despesas e doações"),
        (name = "Promissory", description = "Promissórias, pagamentos e cobrança"),
        (name = "Notifications", description = "Envio de e-mails pela conta da loja")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_store_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/sales"));
        assert!(paths.contains_key("/api/promissory-notes/{id}/selection"));
        assert!(paths.contains_key("/api/ledger/export.csv"));

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }
}
