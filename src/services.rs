pub mod auth;
pub mod collection_service;
pub mod dashboard_service;
pub mod document_service;
pub mod installments;
pub mod inventory_service;
pub mod ledger_service;
pub mod mailer;
pub mod promissory_service;
pub mod sales_service;
