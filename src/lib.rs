//! A point-of-sale transaction ledger.
//!
//! Records sales transactions made at a store's registers together with their
//! line items, and looks products up by their barcode. Every change to a
//! transaction's line items keeps the transaction's `TOTAL_AMT` equal to the
//! sum of its line item prices.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod database_id;
mod db;
mod endpoints;
mod error;
mod logging;
mod product;
mod routing;
mod transaction;
mod transaction_detail;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::{DetailMessage, Error};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use product::{
    ImportSummary, Product, SkippedRow, delete_product, get_product, get_product_by_code,
    import_products, upsert_product,
};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionFields, TransactionWithDetails};
pub use transaction_detail::{NewTransactionDetail, TransactionDetail};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
