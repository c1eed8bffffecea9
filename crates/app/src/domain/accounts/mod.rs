//! Accounts and access tokens

pub mod errors;
pub mod records;
mod repository;
pub mod service;

pub use errors::AccountsServiceError;
pub use service::*;
