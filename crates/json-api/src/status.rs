//! Status Handler

use salvo::prelude::*;
use serde_json::{Map, Value};

/// Liveness probe for Matrix clients discovering the API version.
#[handler]
pub(crate) async fn handler() -> Json<Map<String, Value>> {
    Json(Map::new())
}
