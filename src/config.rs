// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        DashboardRepository, LedgerRepository, ProductRepository, PromissoryRepository,
        StockRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        collection_service::CollectionService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        inventory_service::InventoryService,
        ledger_service::LedgerService,
        mailer::{Mailer, SmtpMailer},
        promissory_service::PromissoryService,
        sales_service::SalesService,
    },
};

// Conta da loja usada no relay SMTP
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub store_name: String,
}

impl MailSettings {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => Some((u.trim(), p)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub mail: MailSettings,
    pub admin_initial_password: Option<String>,
    pub fonts_dir: String,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match optional("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", raw))?,
            None => 5,
        };

        let store_name = optional("STORE_NAME").unwrap_or_else(|| "Wolf Artigos Militares".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr: optional("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            mail: MailSettings {
                smtp_host: optional("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                user: optional("EMAIL_LOJA"),
                password: optional("EMAIL_SENHA"),
                store_name,
            },
            admin_initial_password: optional("ADMIN_INITIAL_PASSWORD"),
            fonts_dir: optional("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub ledger_service: LedgerService,
    pub promissory_service: PromissoryService,
    pub collection_service: CollectionService,
    pub document_service: DocumentService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let i18n_store = I18nStore::load().context("Falha ao carregar os catálogos de mensagens")?;

        if config.mail.credentials().is_none() {
            tracing::warn!("EMAIL_LOJA/EMAIL_SENHA não definidos; envio de e-mails desativado");
        }
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(config.mail.clone()));

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let stock_repo = StockRepository::new(db_pool.clone());
        let ledger_repo = LedgerRepository::new(db_pool.clone());
        let promissory_repo = PromissoryRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new();

        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), db_pool.clone());
        let inventory_service =
            InventoryService::new(product_repo.clone(), stock_repo.clone(), ledger_repo.clone());
        let sales_service = SalesService::new(
            product_repo.clone(),
            stock_repo.clone(),
            ledger_repo.clone(),
            promissory_repo.clone(),
        );
        let ledger_service = LedgerService::new(ledger_repo.clone(), product_repo, stock_repo);
        let promissory_service = PromissoryService::new(promissory_repo.clone(), ledger_repo);
        let collection_service =
            CollectionService::new(promissory_repo, mailer, config.mail.store_name.clone());
        let document_service =
            DocumentService::new(config.fonts_dir.clone(), config.mail.store_name.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(i18n_store),
            auth_service,
            inventory_service,
            sales_service,
            ledger_service,
            promissory_service,
            collection_service,
            document_service,
            dashboard_service,
        })
    }
}
