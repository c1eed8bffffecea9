//! Terms Handlers

pub(crate) mod accept_terms;
pub(crate) mod get_terms;
