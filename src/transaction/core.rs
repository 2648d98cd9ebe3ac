//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    db::begin_unit_of_work,
    transaction_detail::{TransactionDetail, get_details},
};

// ============================================================================
// MODELS
// ============================================================================

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] as RFC 3339 and deserializes it from
    //! either RFC 3339 or an ISO 8601 date-time without an offset.
    //!
    //! Registers send local timestamps such as "2025-01-15T12:30:00" with no
    //! offset. These are taken to be UTC.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
        format_description::well_known::Rfc3339, macros::format_description,
    };

    /// Date-time without an offset, e.g. "2025-01-15T12:30:00" or "2025-01-15T12:30:00.123456".
    const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(s, &Rfc3339).or_else(|rfc3339_error| {
            PrimitiveDateTime::parse(s, NAIVE_DATE_TIME_FORMAT)
                .map(PrimitiveDateTime::assume_utc)
                .map_err(|_| rfc3339_error)
        })
    }
}

/// The fields of a sale that the register provides.
///
/// Used as the request body both for creating a transaction and for
/// replacing all fields of an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionFields {
    /// When the sale happened.
    #[serde(with = "datetime_format")]
    pub datetime: OffsetDateTime,
    /// The code of the employee operating the register.
    pub emp_cd: String,
    /// The code of the store the register belongs to.
    pub store_cd: String,
    /// The register number within the store.
    pub pos_no: String,
    /// The total amount of the sale in the smallest currency unit.
    ///
    /// New transactions usually start at 0 and the total is then maintained
    /// as line items are added and removed.
    pub total_amt: i64,
}

/// A sale recorded at a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Transaction {
    /// The ID of the transaction, assigned by the database.
    pub trd_id: TransactionId,
    /// When the sale happened.
    #[serde(with = "datetime_format")]
    pub datetime: OffsetDateTime,
    /// The code of the employee operating the register.
    pub emp_cd: String,
    /// The code of the store the register belongs to.
    pub store_cd: String,
    /// The register number within the store.
    pub pos_no: String,
    /// The sum of the prices of the transaction's line items.
    pub total_amt: i64,
}

/// A transaction together with all of its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWithDetails {
    /// The transaction.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The line items, ordered by detail ID.
    pub details: Vec<TransactionDetail>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "TRD_ID, DATETIME, EMP_CD, STORE_CD, POS_NO, TOTAL_AMT";

/// Create a new transaction in the database.
///
/// The total is stored as given.
///
/// # Errors
/// Returns [Error::SqlError] if a field is wider than its column or there is some other SQL error.
pub fn create_transaction(
    fields: &TransactionFields,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO transactions (DATETIME, EMP_CD, STORE_CD, POS_NO, TOTAL_AMT)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                fields.datetime,
                &fields.emp_cd,
                &fields.store_cd,
                &fields.pos_no,
                fields.total_amt,
            ),
            map_transaction_row,
        )?;

    tracing::debug!("created transaction {}", transaction.trd_id);

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE TRD_ID = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .optional()?
        .ok_or(Error::TransactionNotFound)
}

/// Retrieve a transaction and its line items by the transaction's `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction_with_details(
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionWithDetails, Error> {
    let transaction = get_transaction(id, connection)?;
    let details = get_details(id, connection)?;

    Ok(TransactionWithDetails {
        transaction,
        details,
    })
}

/// Retrieve all transactions in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn list_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY TRD_ID ASC"
        ))?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Replace every field of the transaction `id` with `fields`.
///
/// The total is stored as given and is not checked against the line items.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    fields: &TransactionFields,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE transactions
             SET DATETIME = ?1, EMP_CD = ?2, STORE_CD = ?3, POS_NO = ?4, TOTAL_AMT = ?5
             WHERE TRD_ID = ?6
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                fields.datetime,
                &fields.emp_cd,
                &fields.store_cd,
                &fields.pos_no,
                fields.total_amt,
                id,
            ),
            map_transaction_row,
        )
        .optional()?
        .ok_or(Error::TransactionNotFound)?;

    tracing::debug!("updated transaction {id}");

    Ok(transaction)
}

/// Delete the transaction `id` together with all of its line items.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let unit_of_work = begin_unit_of_work(connection)?;

    // Line items are removed by the ON DELETE CASCADE on transaction_details.
    let rows_affected =
        unit_of_work.execute("DELETE FROM transactions WHERE TRD_ID = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    unit_of_work.commit()?;

    tracing::debug!("deleted transaction {id}");

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                TRD_ID INTEGER PRIMARY KEY AUTOINCREMENT,
                DATETIME TEXT NOT NULL,
                EMP_CD TEXT NOT NULL CHECK (length(EMP_CD) <= 10),
                STORE_CD TEXT NOT NULL CHECK (length(STORE_CD) <= 5),
                POS_NO TEXT NOT NULL CHECK (length(POS_NO) <= 3),
                TOTAL_AMT INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let trd_id = row.get(0)?;
    let datetime = row.get(1)?;
    let emp_cd = row.get(2)?;
    let store_cd = row.get(3)?;
    let pos_no = row.get(4)?;
    let total_amt = row.get(5)?;

    Ok(Transaction {
        trd_id,
        datetime,
        emp_cd,
        store_cd,
        pos_no,
        total_amt,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod serde_tests {
    use time::macros::datetime;

    use super::TransactionFields;

    fn fields_json(datetime: &str) -> String {
        format!(
            r#"{{"DATETIME":"{datetime}","EMP_CD":"9999999999","STORE_CD":"30","POS_NO":"90","TOTAL_AMT":0}}"#
        )
    }

    #[test]
    fn deserializes_rfc3339_datetime() {
        let fields: TransactionFields =
            serde_json::from_str(&fields_json("2025-01-15T12:30:00+09:00")).unwrap();

        assert_eq!(fields.datetime, datetime!(2025-01-15 03:30:00 UTC));
    }

    #[test]
    fn deserializes_datetime_without_offset_as_utc() {
        let fields: TransactionFields =
            serde_json::from_str(&fields_json("2025-01-15T12:30:00")).unwrap();

        assert_eq!(fields.datetime, datetime!(2025-01-15 12:30:00 UTC));
    }

    #[test]
    fn deserializes_datetime_without_offset_with_fraction() {
        let fields: TransactionFields =
            serde_json::from_str(&fields_json("2025-01-15T12:30:00.123456")).unwrap();

        assert_eq!(fields.datetime, datetime!(2025-01-15 12:30:00.123456 UTC));
    }

    #[test]
    fn rejects_datetime_that_is_not_iso_8601() {
        let result = serde_json::from_str::<TransactionFields>(&fields_json("15/01/2025 12:30"));

        assert!(result.is_err());
    }

    #[test]
    fn serializes_as_rfc3339() {
        let fields: TransactionFields =
            serde_json::from_str(&fields_json("2025-01-15T12:30:00")).unwrap();

        let json = serde_json::to_value(&fields).unwrap();

        assert_eq!(json["DATETIME"], "2025-01-15T12:30:00Z");
    }
}
