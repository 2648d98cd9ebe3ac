//! Defines the product model and the database queries for the product master.

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::ProductId, db::begin_unit_of_work};

// ============================================================================
// MODELS
// ============================================================================

/// An item that can be sold at the register.
///
/// Line items copy the code, name and price of a product when they are
/// created, so changing a product never alters past transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Product {
    /// The ID of the product, assigned outside of this service.
    pub prd_id: ProductId,
    /// The code printed on the product, e.g. an EAN-13 barcode.
    pub code: String,
    /// The display name of the product.
    pub name: String,
    /// The unit price in the smallest currency unit.
    pub price: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Retrieve a product by its `code`.
///
/// # Errors
/// This function will return a:
/// - [Error::ProductNotFound] if no product has the code `code`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_product_by_code(code: &str, connection: &Connection) -> Result<Product, Error> {
    connection
        .prepare("SELECT PRD_ID, CODE, NAME, PRICE FROM products WHERE CODE = :code")?
        .query_row(&[(":code", code)], map_product_row)
        .optional()?
        .ok_or(Error::ProductNotFound)
}

/// Retrieve a product by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ProductNotFound] if `id` does not refer to a product,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_product(id: ProductId, connection: &Connection) -> Result<Product, Error> {
    connection
        .prepare("SELECT PRD_ID, CODE, NAME, PRICE FROM products WHERE PRD_ID = :id")?
        .query_row(&[(":id", &id)], map_product_row)
        .optional()?
        .ok_or(Error::ProductNotFound)
}

/// Insert `product`, or overwrite the code, name and price of the product with the same ID.
///
/// # Errors
/// Returns [Error::SqlError] if the code is already used by a different
/// product, a field is wider than its column, or there is some other SQL error.
pub fn upsert_product(product: &Product, connection: &Connection) -> Result<(), Error> {
    write_product(product, connection)?;

    tracing::debug!("upserted product {} ({})", product.prd_id, product.code);

    Ok(())
}

/// The statement behind [upsert_product], returning the raw SQLite error so
/// that callers expecting constraint failures can handle them without the
/// error being logged as unexpected.
pub(crate) fn write_product(
    product: &Product,
    connection: &Connection,
) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT INTO products (PRD_ID, CODE, NAME, PRICE) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(PRD_ID) DO UPDATE SET
            CODE = excluded.CODE,
            NAME = excluded.NAME,
            PRICE = excluded.PRICE",
        (product.prd_id, &product.code, &product.name, product.price),
    )?;

    Ok(())
}

/// Delete the product with the ID `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ProductInUse] if a transaction detail still references the product,
/// - [Error::ProductNotFound] if `id` does not refer to a product,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_product(id: ProductId, connection: &Connection) -> Result<(), Error> {
    let unit_of_work = begin_unit_of_work(connection)?;

    let in_use = unit_of_work
        .query_row(
            "SELECT 1 FROM transaction_details WHERE PRD_ID = ?1 LIMIT 1",
            [id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    if in_use {
        return Err(Error::ProductInUse(id));
    }

    // The foreign key on transaction_details still rejects the delete if a
    // reference slipped past the check above.
    let rows_affected = unit_of_work
        .execute("DELETE FROM products WHERE PRD_ID = ?1", [id])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: ErrorCode::ConstraintViolation,
                    extended_code:
                        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER,
                },
                _,
            ) => Error::ProductInUse(id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::ProductNotFound);
    }

    unit_of_work.commit()?;

    tracing::debug!("deleted product {id}");

    Ok(())
}

/// Create the product table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS products (
                PRD_ID INTEGER PRIMARY KEY,
                CODE TEXT NOT NULL UNIQUE CHECK (length(CODE) <= 13),
                NAME TEXT NOT NULL CHECK (length(NAME) <= 50),
                PRICE INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Product.
fn map_product_row(row: &Row) -> Result<Product, rusqlite::Error> {
    let prd_id = row.get(0)?;
    let code = row.get(1)?;
    let name = row.get(2)?;
    let price = row.get(3)?;

    Ok(Product {
        prd_id,
        code,
        name,
        price,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        product::{Product, delete_product, get_product, get_product_by_code, upsert_product},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn test_product() -> Product {
        Product {
            prd_id: 1,
            code: "4901234567894".to_owned(),
            name: "Green tea 500ml".to_owned(),
            price: 150,
        }
    }

    #[test]
    fn get_by_code_succeeds() {
        let conn = get_test_connection();
        let product = test_product();
        upsert_product(&product, &conn).unwrap();

        let got = get_product_by_code(&product.code, &conn);

        assert_eq!(got, Ok(product));
    }

    #[test]
    fn get_by_code_fails_on_unknown_code() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();

        let got = get_product_by_code("0000000000000", &conn);

        assert_eq!(got, Err(Error::ProductNotFound));
    }

    #[test]
    fn get_by_code_is_exact_match() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();

        let got = get_product_by_code("490123456789", &conn);

        assert_eq!(got, Err(Error::ProductNotFound));
    }

    #[test]
    fn upsert_overwrites_existing_product() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();
        let updated = Product {
            price: 180,
            ..test_product()
        };

        upsert_product(&updated, &conn).unwrap();

        assert_eq!(get_product(updated.prd_id, &conn), Ok(updated));
    }

    #[test]
    fn upsert_rejects_duplicate_code() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();
        let clash = Product {
            prd_id: 2,
            ..test_product()
        };

        let result = upsert_product(&clash, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn upsert_rejects_code_longer_than_column() {
        let conn = get_test_connection();
        let product = Product {
            code: "49012345678941".to_owned(),
            ..test_product()
        };

        let result = upsert_product(&product, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn delete_succeeds() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();

        delete_product(1, &conn).unwrap();

        assert_eq!(get_product(1, &conn), Err(Error::ProductNotFound));
    }

    #[test]
    fn delete_fails_on_missing_product() {
        let conn = get_test_connection();

        assert_eq!(delete_product(42, &conn), Err(Error::ProductNotFound));
    }

    #[test]
    fn delete_fails_while_a_detail_references_the_product() {
        let conn = get_test_connection();
        upsert_product(&test_product(), &conn).unwrap();
        conn.execute_batch(
            "INSERT INTO transactions (DATETIME, EMP_CD, STORE_CD, POS_NO, TOTAL_AMT)
                VALUES ('2025-01-15 12:30:00.0+00:00', '9999999999', '30', '90', 150);
             INSERT INTO transaction_details (TRD_ID, DTL_ID, PRD_ID, PRD_CODE, PRD_NAME, PRD_PRICE)
                VALUES (1, 1, 1, '4901234567894', 'Green tea 500ml', 150);",
        )
        .unwrap();

        assert_eq!(delete_product(1, &conn), Err(Error::ProductInUse(1)));
        assert_eq!(get_product(1, &conn), Ok(test_product()));
    }
}
