//! The product master.
//!
//! This module contains everything related to products:
//! - The `Product` model and the product table
//! - Catalog queries, including the restricted delete and upserts used by the catalog tool
//! - CSV import for seeding the catalog
//! - The route handler for looking up a product by its code

mod core;
mod get_by_code_endpoint;
mod import;

pub use core::{
    Product, create_product_table, delete_product, get_product, get_product_by_code,
    upsert_product,
};
pub use get_by_code_endpoint::get_product_by_code_endpoint;
pub use import::{ImportSummary, SkippedRow, import_products};
