//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The store-assigned ID of a transaction (`TRD_ID`).
pub type TransactionId = DatabaseId;

/// The caller-assigned ID of a line item, unique within its transaction (`DTL_ID`).
pub type DetailId = DatabaseId;

/// The externally assigned ID of a product (`PRD_ID`).
pub type ProductId = DatabaseId;
