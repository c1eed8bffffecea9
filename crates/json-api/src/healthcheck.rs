//! Healthcheck Handler

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}

/// Process liveness for load balancers and orchestrators.
#[handler]
pub(crate) async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
