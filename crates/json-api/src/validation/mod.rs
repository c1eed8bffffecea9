//! Threepid validation sessions

pub(crate) mod errors;
pub(crate) mod handlers;

pub(crate) use errors::into_matrix_error;
pub(crate) use handlers::*;
