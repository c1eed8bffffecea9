//! Association Records

use serde_json::Value;

use crate::domain::{sessions::records::SessionId, threepids::Medium};

/// Association Record
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRecord {
    pub id: i64,
    pub medium: Medium,
    pub address: String,
    pub mxid: String,
    pub ts: i64,
    pub not_before: i64,
    pub not_after: i64,
    pub origin_server: String,
    pub origin_session_id: SessionId,

    /// The association object as signed, including its `signatures`.
    pub signed_association: Value,
}

/// A threepid found by a bulk lookup and the user it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundThreepid {
    pub medium: Medium,
    pub address: String,
    pub mxid: String,
}

/// Columns for an association that has not been stored yet.
#[derive(Debug, Clone)]
pub(crate) struct NewAssociation<'a> {
    pub medium: Medium,
    pub address: &'a str,
    pub mxid: &'a str,
    pub ts: i64,
    pub not_before: i64,
    pub not_after: i64,
    pub origin_server: &'a str,
    pub origin_session_id: SessionId,
    pub signed_association: &'a Value,
}

