pub mod analysis;
pub mod core;
pub mod investment;
pub mod market;
pub mod portfolio;
pub mod profile;
pub mod report;
pub mod store;
pub mod suggestion;
pub mod user;

pub use database_adapter::db::{DbError, Repository};
