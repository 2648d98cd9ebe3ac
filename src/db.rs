//! Sets up the application database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, product::create_product_table, transaction::create_transaction_table,
    transaction_detail::create_transaction_detail_table,
};

/// Create the tables for the domain models if they do not exist yet.
///
/// Also switches on foreign key enforcement for `connection`, which SQLite
/// leaves off by default. The cascade and restrict rules on line items rely on it.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    enable_foreign_keys(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_product_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transaction_detail_table(&transaction)?;

    transaction.commit()?;

    tracing::debug!("database initialized");

    Ok(())
}

/// Switch on foreign key enforcement for `connection`.
///
/// SQLite tracks this per connection, so it must be set every time a database is opened.
pub fn enable_foreign_keys(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    Ok(())
}

/// Start a unit of work on `connection`.
///
/// The write lock is taken immediately so that the reads made while checking
/// preconditions cannot go stale before the writes that depend on them.
/// The returned transaction rolls back when dropped unless it is committed.
pub(crate) fn begin_unit_of_work(connection: &Connection) -> Result<SqlTransaction<'_>, Error> {
    SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&connection), Ok(()));
        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
