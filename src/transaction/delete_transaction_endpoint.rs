//! Defines the endpoint for deleting a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, database_id::TransactionId, error::DetailMessage,
    transaction::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction and its line items, responds with an acknowledgement.
///
/// Responds with 404 if the transaction does not exist.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<DetailMessage>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_transaction(transaction_id, &connection).inspect_err(|error| {
        tracing::warn!("Could not delete transaction {transaction_id}: {error}")
    })?;

    Ok(Json(DetailMessage::new("Transaction deleted.")))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        error::DetailMessage,
        transaction::{TransactionFields, create_transaction, get_transaction},
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    #[tokio::test]
    async fn test_deletes_transaction() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let transaction = create_transaction(
            &TransactionFields {
                datetime: datetime!(2025-10-26 10:00:00 UTC),
                emp_cd: "9999999999".to_owned(),
                store_cd: "30".to_owned(),
                pos_no: "90".to_owned(),
                total_amt: 0,
            },
            &connection,
        )
        .unwrap();
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let message = delete_transaction_endpoint(State(state.clone()), Path(transaction.trd_id))
            .await
            .expect("Could not delete transaction");

        assert_eq!(message.0, DetailMessage::new("Transaction deleted."));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(transaction.trd_id, &connection),
            Err(Error::TransactionNotFound)
        );
    }
}
