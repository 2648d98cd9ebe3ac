//! Defines the endpoint for looking up a product by its code.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    product::{Product, get_product_by_code},
};

/// The state needed to look up a product.
#[derive(Debug, Clone)]
pub struct GetProductState {
    /// The database connection for reading the product master.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetProductState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting the product with the code `code`.
///
/// Responds with 404 if no product has that exact code.
pub async fn get_product_by_code_endpoint(
    State(state): State<GetProductState>,
    Path(code): Path<String>,
) -> Result<Json<Product>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_product_by_code(&code, &connection)
        .inspect_err(|error| tracing::debug!("could not get product with code {code:?}: {error}"))
        .map(Json)
}
