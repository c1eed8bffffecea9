//! Account Records

/// An identity server account, keyed by Matrix user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub user_id: String,
    pub created_ts: i64,
    pub consent_version: Option<String>,
}
