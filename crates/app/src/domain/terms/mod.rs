//! Terms of service and account consent

pub mod data;
pub mod errors;
mod repository;
pub mod service;

pub use data::Terms;
pub use errors::{TermsFileError, TermsServiceError};
pub use service::*;
