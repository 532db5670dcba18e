pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod ledger;
pub mod notifications;
pub mod products;
pub mod promissory;
pub mod sales;
pub mod users;
