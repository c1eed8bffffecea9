//! Identity Domain Concerns

pub mod accounts;
pub mod associations;
pub mod sessions;
pub mod terms;
pub mod threepids;
