//! Defines the endpoint for listing transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{Transaction, list_transactions},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing every transaction, without line items.
// TODO: Add paging, the response grows with every transaction ever recorded.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    list_transactions(&connection).map(Json)
}
