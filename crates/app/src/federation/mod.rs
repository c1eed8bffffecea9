//! Outbound federation requests to homeservers.

pub mod client;
pub mod server_name;

pub use client::*;
pub use server_name::{InvalidServerName, ServerName};
