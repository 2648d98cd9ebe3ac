//! Defines the line item models and the queries that keep transaction totals consistent.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{DetailId, ProductId, TransactionId},
    db::begin_unit_of_work,
    product::get_product,
    transaction::get_transaction,
};

// ============================================================================
// MODELS
// ============================================================================

/// The request body for adding a line item to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NewTransactionDetail {
    /// The ID of the line item, chosen by the register. Must be unique within the transaction.
    pub dtl_id: DetailId,
    /// The product that was sold.
    pub prd_id: ProductId,
    /// The product code at the time of sale.
    pub prd_code: String,
    /// The product name at the time of sale.
    pub prd_name: String,
    /// The price charged in the smallest currency unit.
    pub prd_price: i64,
}

/// A line item of a transaction.
///
/// The product code, name and price are a snapshot taken when the line item
/// was created and do not follow later changes to the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionDetail {
    /// The transaction the line item belongs to.
    pub trd_id: TransactionId,
    /// The ID of the line item within its transaction.
    pub dtl_id: DetailId,
    /// The product that was sold.
    pub prd_id: ProductId,
    /// The product code at the time of sale.
    pub prd_code: String,
    /// The product name at the time of sale.
    pub prd_name: String,
    /// The price charged in the smallest currency unit.
    pub prd_price: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Add a line item to the transaction `trd_id` and update the transaction's total.
///
/// The insert and the total update are committed together, or not at all.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `trd_id` does not refer to a valid transaction,
/// - [Error::DuplicateDetailId] if the transaction already has a line item with the same detail ID,
/// - [Error::ProductNotFound] if the product ID does not refer to a valid product,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_detail(
    trd_id: TransactionId,
    detail: &NewTransactionDetail,
    connection: &Connection,
) -> Result<TransactionDetail, Error> {
    let unit_of_work = begin_unit_of_work(connection)?;

    get_transaction(trd_id, &unit_of_work)?;

    if detail_exists(trd_id, detail.dtl_id, &unit_of_work)? {
        return Err(Error::DuplicateDetailId);
    }

    get_product(detail.prd_id, &unit_of_work)?;

    let inserted = unit_of_work
        .prepare(
            "INSERT INTO transaction_details (TRD_ID, DTL_ID, PRD_ID, PRD_CODE, PRD_NAME, PRD_PRICE)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING TRD_ID, DTL_ID, PRD_ID, PRD_CODE, PRD_NAME, PRD_PRICE",
        )?
        .query_row(
            (
                trd_id,
                detail.dtl_id,
                detail.prd_id,
                &detail.prd_code,
                &detail.prd_name,
                detail.prd_price,
            ),
            map_detail_row,
        )?;

    let total = sync_total(trd_id, &unit_of_work)?;

    unit_of_work.commit()?;

    tracing::debug!(
        "added detail {} to transaction {trd_id}, total is now {total}",
        inserted.dtl_id
    );

    Ok(inserted)
}

/// Remove the line item `dtl_id` from the transaction `trd_id` and update the transaction's total.
///
/// The total becomes 0 once the last line item is removed.
/// The delete and the total update are committed together, or not at all.
///
/// # Errors
/// This function will return a:
/// - [Error::DetailNotFound] if the transaction has no line item with the ID `dtl_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_detail(
    trd_id: TransactionId,
    dtl_id: DetailId,
    connection: &Connection,
) -> Result<(), Error> {
    let unit_of_work = begin_unit_of_work(connection)?;

    let rows_affected = unit_of_work.execute(
        "DELETE FROM transaction_details WHERE TRD_ID = ?1 AND DTL_ID = ?2",
        (trd_id, dtl_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DetailNotFound);
    }

    let total = sync_total(trd_id, &unit_of_work)?;

    unit_of_work.commit()?;

    tracing::debug!("deleted detail {dtl_id} from transaction {trd_id}, total is now {total}");

    Ok(())
}

/// Retrieve the line items of the transaction `trd_id`, ordered by detail ID.
///
/// Returns an empty list if the transaction has no line items or does not exist.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_details(
    trd_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<TransactionDetail>, Error> {
    connection
        .prepare(
            "SELECT TRD_ID, DTL_ID, PRD_ID, PRD_CODE, PRD_NAME, PRD_PRICE
             FROM transaction_details
             WHERE TRD_ID = :trd_id
             ORDER BY DTL_ID ASC",
        )?
        .query_map(&[(":trd_id", &trd_id)], map_detail_row)?
        .map(|maybe_detail| maybe_detail.map_err(Error::from))
        .collect()
}

fn detail_exists(
    trd_id: TransactionId,
    dtl_id: DetailId,
    connection: &Connection,
) -> Result<bool, Error> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM transaction_details WHERE TRD_ID = ?1 AND DTL_ID = ?2",
            (trd_id, dtl_id),
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    Ok(exists)
}

/// Set the total of the transaction `trd_id` to the sum of its line item prices.
///
/// Both adding and removing line items recompute the sum rather than adjusting
/// the stored total, so a total that was overwritten by an update is corrected
/// by the next change to the line items.
fn sync_total(trd_id: TransactionId, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "UPDATE transactions
             SET TOTAL_AMT = (
                SELECT COALESCE(SUM(PRD_PRICE), 0) FROM transaction_details WHERE TRD_ID = ?1
             )
             WHERE TRD_ID = ?1
             RETURNING TOTAL_AMT",
            [trd_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::TransactionNotFound)
}

/// Create the transaction detail table in the database.
///
/// Line items are deleted with their transaction, and a product cannot be
/// deleted while a line item refers to it.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_detail_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_details (
            TRD_ID INTEGER NOT NULL,
            DTL_ID INTEGER NOT NULL,
            PRD_ID INTEGER NOT NULL,
            PRD_CODE TEXT NOT NULL CHECK (length(PRD_CODE) <= 13),
            PRD_NAME TEXT NOT NULL CHECK (length(PRD_NAME) <= 50),
            PRD_PRICE INTEGER NOT NULL,
            PRIMARY KEY (TRD_ID, DTL_ID),
            FOREIGN KEY(TRD_ID) REFERENCES transactions(TRD_ID) ON DELETE CASCADE,
            FOREIGN KEY(PRD_ID) REFERENCES products(PRD_ID) ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_details_prd_id ON transaction_details(PRD_ID);",
    )?;

    Ok(())
}

/// Map a database row to a TransactionDetail.
fn map_detail_row(row: &Row) -> Result<TransactionDetail, rusqlite::Error> {
    let trd_id = row.get(0)?;
    let dtl_id = row.get(1)?;
    let prd_id = row.get(2)?;
    let prd_code = row.get(3)?;
    let prd_name = row.get(4)?;
    let prd_price = row.get(5)?;

    Ok(TransactionDetail {
        trd_id,
        dtl_id,
        prd_id,
        prd_code,
        prd_name,
        prd_price,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        database_id::{DetailId, ProductId, TransactionId},
        db::initialize,
        product::{Product, delete_product, upsert_product},
        transaction::{
            Transaction, TransactionFields, create_transaction, delete_transaction,
            get_transaction, get_transaction_with_details, update_transaction,
        },
        transaction_detail::{NewTransactionDetail, add_detail, delete_detail, get_details},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for (prd_id, code, name, price) in [
            (1, "4901234567894", "Green tea 500ml", 150),
            (2, "4909876543210", "Rice ball", 300),
        ] {
            upsert_product(
                &Product {
                    prd_id,
                    code: code.to_owned(),
                    name: name.to_owned(),
                    price,
                },
                &conn,
            )
            .unwrap();
        }

        conn
    }

    fn create_test_transaction(conn: &Connection) -> Transaction {
        create_transaction(
            &TransactionFields {
                datetime: datetime!(2025-01-15 12:30:00 UTC),
                emp_cd: "9999999999".to_owned(),
                store_cd: "30".to_owned(),
                pos_no: "90".to_owned(),
                total_amt: 0,
            },
            conn,
        )
        .unwrap()
    }

    fn new_detail(dtl_id: DetailId, prd_id: ProductId, prd_price: i64) -> NewTransactionDetail {
        NewTransactionDetail {
            dtl_id,
            prd_id,
            prd_code: "4901234567894".to_owned(),
            prd_name: "Green tea 500ml".to_owned(),
            prd_price,
        }
    }

    #[track_caller]
    fn assert_total_matches_details(trd_id: TransactionId, conn: &Connection) {
        let transaction = get_transaction_with_details(trd_id, conn).unwrap();
        let sum: i64 = transaction.details.iter().map(|d| d.prd_price).sum();

        assert_eq!(transaction.transaction.total_amt, sum);
    }

    #[test]
    fn add_detail_returns_stored_detail() {
        let conn = get_test_connection();
        let transaction = create_test_transaction(&conn);
        let detail = new_detail(1, 1, 150);

        let got = add_detail(transaction.trd_id, &detail, &conn).unwrap();

        assert_eq!(got.trd_id, transaction.trd_id);
        assert_eq!(got.dtl_id, detail.dtl_id);
        assert_eq!(got.prd_id, detail.prd_id);
        assert_eq!(got.prd_code, detail.prd_code);
        assert_eq!(got.prd_name, detail.prd_name);
        assert_eq!(got.prd_price, detail.prd_price);
        assert_eq!(get_details(transaction.trd_id, &conn), Ok(vec![got]));
    }

    #[test]
    fn totals_follow_adds_and_deletes() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;

        add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();
        add_detail(trd_id, &new_detail(2, 2, 300), &conn).unwrap();
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 450);

        delete_detail(trd_id, 1, &conn).unwrap();
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 300);
    }

    #[test]
    fn total_matches_details_after_every_change() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;

        for (dtl_id, price) in [(1, 150), (2, 300), (3, 120), (4, 999)] {
            add_detail(trd_id, &new_detail(dtl_id, 1, price), &conn).unwrap();
            assert_total_matches_details(trd_id, &conn);
        }

        for dtl_id in [3, 1, 4] {
            delete_detail(trd_id, dtl_id, &conn).unwrap();
            assert_total_matches_details(trd_id, &conn);
        }
    }

    #[test]
    fn deleting_last_detail_sets_total_to_zero() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();

        delete_detail(trd_id, 1, &conn).unwrap();

        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 0);
    }

    #[test]
    fn add_detail_fails_on_missing_transaction() {
        let conn = get_test_connection();

        let result = add_detail(42, &new_detail(1, 1, 150), &conn);

        assert_eq!(result, Err(Error::TransactionNotFound));
    }

    #[test]
    fn add_detail_fails_on_duplicate_detail_id_and_leaves_transaction_unchanged() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        let original = add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();
        let before = get_transaction_with_details(trd_id, &conn).unwrap();

        let result = add_detail(trd_id, &new_detail(1, 2, 300), &conn);

        assert_eq!(result, Err(Error::DuplicateDetailId));
        let after = get_transaction_with_details(trd_id, &conn).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.details, vec![original]);
    }

    #[test]
    fn same_detail_id_is_allowed_in_different_transactions() {
        let conn = get_test_connection();
        let first = create_test_transaction(&conn).trd_id;
        let second = create_test_transaction(&conn).trd_id;
        add_detail(first, &new_detail(1, 1, 150), &conn).unwrap();

        let result = add_detail(second, &new_detail(1, 1, 150), &conn);

        assert!(result.is_ok());
    }

    #[test]
    fn add_detail_fails_on_missing_product_and_leaves_transaction_unchanged() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;

        let result = add_detail(trd_id, &new_detail(1, 42, 150), &conn);

        assert_eq!(result, Err(Error::ProductNotFound));
        assert_eq!(get_details(trd_id, &conn), Ok(vec![]));
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 0);
    }

    #[test]
    fn failed_insert_rolls_back() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        let overlong_name = NewTransactionDetail {
            prd_name: "x".repeat(51),
            ..new_detail(1, 1, 150)
        };

        let result = add_detail(trd_id, &overlong_name, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
        assert_eq!(get_details(trd_id, &conn), Ok(vec![]));
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 0);
    }

    #[test]
    fn delete_detail_fails_on_missing_detail() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();

        assert_eq!(delete_detail(trd_id, 2, &conn), Err(Error::DetailNotFound));
        assert_eq!(delete_detail(42, 1, &conn), Err(Error::DetailNotFound));
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 150);
    }

    #[test]
    fn detail_change_corrects_manually_set_total() {
        let conn = get_test_connection();
        let transaction = create_test_transaction(&conn);
        add_detail(transaction.trd_id, &new_detail(1, 1, 150), &conn).unwrap();
        let fields = TransactionFields {
            datetime: transaction.datetime,
            emp_cd: transaction.emp_cd.clone(),
            store_cd: transaction.store_cd.clone(),
            pos_no: transaction.pos_no.clone(),
            total_amt: 10_000,
        };
        update_transaction(transaction.trd_id, &fields, &conn).unwrap();

        add_detail(transaction.trd_id, &new_detail(2, 2, 300), &conn).unwrap();

        assert_total_matches_details(transaction.trd_id, &conn);
    }

    #[test]
    fn deleting_transaction_removes_only_its_details() {
        let conn = get_test_connection();
        let doomed = create_test_transaction(&conn).trd_id;
        let survivor = create_test_transaction(&conn).trd_id;
        add_detail(doomed, &new_detail(1, 1, 150), &conn).unwrap();
        add_detail(doomed, &new_detail(2, 2, 300), &conn).unwrap();
        add_detail(survivor, &new_detail(1, 1, 150), &conn).unwrap();

        delete_transaction(doomed, &conn).unwrap();

        assert_eq!(get_details(doomed, &conn), Ok(vec![]));
        assert_eq!(delete_detail(doomed, 1, &conn), Err(Error::DetailNotFound));
        assert_eq!(get_details(survivor, &conn).unwrap().len(), 1);
        assert_eq!(get_transaction(survivor, &conn).unwrap().total_amt, 150);
    }

    #[test]
    fn details_keep_price_snapshot_after_product_changes() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();

        upsert_product(
            &Product {
                prd_id: 1,
                code: "4901234567894".to_owned(),
                name: "Green tea 500ml".to_owned(),
                price: 180,
            },
            &conn,
        )
        .unwrap();

        let details = get_details(trd_id, &conn).unwrap();
        assert_eq!(details[0].prd_price, 150);
        assert_eq!(get_transaction(trd_id, &conn).unwrap().total_amt, 150);
    }

    #[test]
    fn product_cannot_be_deleted_while_referenced() {
        let conn = get_test_connection();
        let trd_id = create_test_transaction(&conn).trd_id;
        add_detail(trd_id, &new_detail(1, 1, 150), &conn).unwrap();

        assert_eq!(delete_product(1, &conn), Err(Error::ProductInUse(1)));

        delete_transaction(trd_id, &conn).unwrap();
        assert_eq!(delete_product(1, &conn), Ok(()));
    }
}
