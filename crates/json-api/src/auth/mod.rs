//! Authentication

pub(crate) mod errors;
pub(crate) mod middleware;

pub(crate) use errors::into_matrix_error;
