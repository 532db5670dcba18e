pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod ledger;
pub mod promissory;
