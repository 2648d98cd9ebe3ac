//! Defines the app level error type and its conversion to JSON responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::database_id::ProductId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested transaction does not exist.
    ///
    /// Also returned when adding a line item to a transaction that has not
    /// been created (or has already been deleted).
    #[error("Transaction not found")]
    TransactionNotFound,

    /// No line item exists with the requested transaction ID and detail ID.
    #[error("Detail not found")]
    DetailNotFound,

    /// No product matched the requested product ID or code.
    #[error("Product not found.")]
    ProductNotFound,

    /// A line item with the same detail ID already exists in the transaction.
    ///
    /// Detail IDs are assigned by the client and must be unique within their
    /// parent transaction.
    #[error("DTL_ID already exists in this transaction.")]
    DuplicateDetailId,

    /// Tried to delete a product that is still referenced by a line item.
    #[error("product {0} is referenced by a transaction detail and cannot be deleted")]
    ProductInUse(ProductId),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    ///
    /// This also covers constraint violations that are not explicitly
    /// checked, e.g. a product code that is longer than the column width.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A product catalog CSV could not be read.
    #[error("could not parse the CSV file: {0}")]
    InvalidCsv(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

/// The JSON body sent for acknowledgements and errors, e.g. `{"detail": "Detail deleted."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailMessage {
    /// A human readable message.
    pub detail: String,
}

impl DetailMessage {
    /// Create a message body from `detail`.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::TransactionNotFound | Error::DetailNotFound | Error::ProductNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateDetailId => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(DetailMessage::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn not_found_variants_map_to_404() {
        for error in [
            Error::TransactionNotFound,
            Error::DetailNotFound,
            Error::ProductNotFound,
        ] {
            assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn duplicate_detail_maps_to_400() {
        let response = Error::DuplicateDetailId.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_faults_map_to_500() {
        let response = Error::SqlError(rusqlite::Error::InvalidQuery).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::DatabaseLockError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
