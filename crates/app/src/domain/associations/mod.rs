//! Signed threepid associations

pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use data::{HashDetails, HashedLookup, LookupAlgorithm, UnsupportedAlgorithm};
pub use errors::AssociationsServiceError;
pub use records::{AssociationRecord, BoundThreepid};
pub use service::*;
