//! Extension traits and request helpers

mod depot;
pub(crate) mod params;

pub(crate) use depot::DepotExt as _;
pub(crate) use params::Params;
