//! Defines the endpoint for adding a line item to a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction_detail::{NewTransactionDetail, TransactionDetail, add_detail},
};

/// The state needed to add a line item.
#[derive(Debug, Clone)]
pub struct AddDetailState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AddDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for adding a line item to a transaction, responds with the stored line item.
///
/// Responds with 404 if the transaction or product does not exist and 400
/// if the transaction already has a line item with the same detail ID.
pub async fn add_detail_endpoint(
    State(state): State<AddDetailState>,
    Path(transaction_id): Path<TransactionId>,
    Json(detail): Json<NewTransactionDetail>,
) -> Result<Json<TransactionDetail>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    add_detail(transaction_id, &detail, &connection)
        .inspect_err(|error| {
            tracing::warn!(
                "Could not add detail {} to transaction {transaction_id}: {error}",
                detail.dtl_id
            )
        })
        .map(Json)
}
