//! Identity server domain, signing and persistence modules.

pub mod clock;
pub mod context;
pub mod crypto;
pub mod database;
pub mod delivery;
pub mod domain;
pub mod federation;
pub mod settings;

#[cfg(test)]
mod test;
