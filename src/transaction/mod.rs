//! Transaction management for the point-of-sale ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the fields the register provides
//! - Database functions for storing, querying, and deleting transactions
//! - Route handlers for the transaction endpoints

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod get_transaction_endpoint;
mod list_transactions_endpoint;
mod update_transaction_endpoint;

pub use core::{
    Transaction, TransactionFields, TransactionWithDetails, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, get_transaction_with_details,
    list_transactions, update_transaction,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use get_transaction_endpoint::get_transaction_endpoint;
pub use list_transactions_endpoint::list_transactions_endpoint;
pub use update_transaction_endpoint::update_transaction_endpoint;
