//! Line items of transactions.
//!
//! Adding or removing a line item also brings the parent transaction's total
//! back in line with the prices of its line items, in the same unit of work.

mod add_detail_endpoint;
mod core;
mod delete_detail_endpoint;

pub use add_detail_endpoint::add_detail_endpoint;
pub use core::{
    NewTransactionDetail, TransactionDetail, add_detail, create_transaction_detail_table,
    delete_detail, get_details,
};
pub use delete_detail_endpoint::delete_detail_endpoint;
