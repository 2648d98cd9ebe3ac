//! Defines the endpoint for replacing the fields of a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{Transaction, TransactionFields, update_transaction},
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for overwriting every field of a transaction, responds with the updated transaction.
///
/// The total in the request body is stored as is. Responds with 404 if the
/// transaction does not exist.
pub async fn update_transaction_endpoint(
    State(state): State<UpdateTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Json(fields): Json<TransactionFields>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_transaction(transaction_id, &fields, &connection)
        .inspect_err(|error| tracing::warn!("Could not update transaction {transaction_id}: {error}"))
        .map(Json)
}
