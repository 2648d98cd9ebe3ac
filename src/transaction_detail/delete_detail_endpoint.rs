//! Defines the endpoint for removing a line item from a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::{DetailId, TransactionId},
    error::DetailMessage,
    transaction_detail::delete_detail,
};

/// The state needed to remove a line item.
#[derive(Debug, Clone)]
pub struct DeleteDetailState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for removing a line item from a transaction, responds with an acknowledgement.
///
/// Responds with 404 if the transaction has no line item with the detail ID.
pub async fn delete_detail_endpoint(
    State(state): State<DeleteDetailState>,
    Path((transaction_id, detail_id)): Path<(TransactionId, DetailId)>,
) -> Result<Json<DetailMessage>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_detail(transaction_id, detail_id, &connection).inspect_err(|error| {
        tracing::warn!("Could not delete detail {detail_id} of transaction {transaction_id}: {error}")
    })?;

    Ok(Json(DetailMessage::new("Detail deleted.")))
}
