//! Account Handlers

pub(crate) mod get_account;
pub(crate) mod logout;
pub(crate) mod register;
