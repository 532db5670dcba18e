//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional (em produção as variáveis vêm do ambiente)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let server_addr = config.server_addr.clone();
    let admin_password = config.admin_initial_password.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    app_state
        .auth_service
        .seed_admin(admin_password.as_deref())
        .await
        .context("Falha ao criar o administrador inicial.")?;

    // Rotas públicas
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login));

    // Rotas protegidas pelo middleware de autenticação
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/"
               ,get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/{id}", delete(handlers::users::delete_user))
        .route("/{id}/password", put(handlers::users::change_password));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/sales-chart", get(handlers::dashboard::get_sales_chart))
        .route("/top-products", get(handlers::dashboard::get_top_products))
        .route("/low-stock", get(handlers::dashboard::get_low_stock));

    let product_routes = Router::new()
        .route("/"
               ,get(handlers::products::list_products)
               .post(handlers::products::save_product)
        )
        .route("/purchases", post(handlers::products::register_purchase));

    let inventory_routes = Router::new()
        .route("/", get(handlers::inventory::get_inventory))
        .route("/report.pdf", get(handlers::inventory::inventory_pdf));

    let ledger_routes = Router::new()
        .route("/", get(handlers::ledger::list_entries))
        .route("/export.csv", get(handlers::ledger::export_csv))
        .route("/entries", post(handlers::ledger::record_entry));

    let promissory_routes = Router::new()
        .route("/", get(handlers::promissory::list_notes))
        .route("/report.pdf", get(handlers::promissory::notes_pdf))
        .route("/collections", post(handlers::promissory::send_collections))
        .route("/{id}/selection", patch(handlers::promissory::set_selection));

    let protected_routes = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/products", product_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/ledger", ledger_routes)
        .nest("/api/promissory-notes", promissory_routes)
        .route("/api/sales", post(handlers::sales::register_sale))
        .route("/api/promissory-payments"
               ,get(handlers::promissory::list_payments)
               .post(handlers::promissory::register_payment)
        )
        .route("/api/notifications/email", post(handlers::notifications::send_email))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}
