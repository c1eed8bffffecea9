//! Shared infrastructure for service-level tests.

pub(crate) mod delivery;
pub(crate) mod helpers;

pub(crate) use context::TestContext;
