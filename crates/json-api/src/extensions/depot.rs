//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use crate::errors::MatrixError;

/// Depot key holding the authenticated user id.
const USER_ID_DEPOT_KEY: &str = "user_id";

/// Helpers for mapping depot extraction failures to Matrix errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, MatrixError>;

    fn insert_user_id(&mut self, user_id: String);

    fn user_id_or_401(&self) -> Result<&str, MatrixError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, MatrixError> {
        self.obtain::<T>()
            .map_err(|_ignored| MatrixError::unknown("Internal server error"))
    }

    fn insert_user_id(&mut self, user_id: String) {
        self.insert(USER_ID_DEPOT_KEY, user_id);
    }

    fn user_id_or_401(&self) -> Result<&str, MatrixError> {
        self.get::<String>(USER_ID_DEPOT_KEY)
            .map(String::as_str)
            .map_err(|_ignored| MatrixError::unauthorized("Unauthorized"))
    }
}
