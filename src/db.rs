pub mod user_repo;
pub use user_repo::UserRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
pub mod promissory_repo;
pub use promissory_repo::PromissoryRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
