//! Identity server accounts

pub(crate) mod handlers;

pub(crate) use handlers::*;
