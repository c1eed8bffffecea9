//! Association Handlers

pub(crate) mod bind;
pub(crate) mod bulk_lookup;
pub(crate) mod hash_details;
pub(crate) mod hashed_lookup;
pub(crate) mod lookup;
pub(crate) mod unbind;
