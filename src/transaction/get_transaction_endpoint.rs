//! Defines the endpoint for getting a transaction with its line items.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{TransactionWithDetails, get_transaction_with_details},
};

/// The state needed to get a transaction.
#[derive(Debug, Clone)]
pub struct GetTransactionState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting a transaction and all of its line items.
///
/// Responds with 404 if the transaction does not exist.
pub async fn get_transaction_endpoint(
    State(state): State<GetTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<TransactionWithDetails>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transaction_with_details(transaction_id, &connection).map(Json)
}
