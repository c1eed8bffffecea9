//! Public keys

pub(crate) mod handlers;

pub(crate) use handlers::*;
