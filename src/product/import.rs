//! Seeds the product master from a CSV file.

use std::io::Read;

use rusqlite::Connection;

use crate::{
    Error,
    db::begin_unit_of_work,
    product::{Product, core::write_product},
};

/// A CSV row that could not be imported.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// The line number in the CSV file, counting the header as line 1.
    pub line: usize,
    /// Why the row was skipped.
    pub reason: String,
}

/// The outcome of [import_products].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    /// The number of products inserted or updated.
    pub imported: usize,
    /// The rows that were not imported.
    pub skipped: Vec<SkippedRow>,
}

/// Insert or update products from CSV text with the header `PRD_ID,CODE,NAME,PRICE`.
///
/// Rows that cannot be parsed or stored are skipped and reported in the
/// summary. All other rows are committed together.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCsv] if the header cannot be read,
/// - or [Error::SqlError] if the import could not be committed.
pub fn import_products<R: Read>(reader: R, connection: &Connection) -> Result<ImportSummary, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .headers()
        .map_err(|error| Error::InvalidCsv(error.to_string()))?;

    let transaction = begin_unit_of_work(connection)?;
    let mut summary = ImportSummary::default();

    for (row_index, record) in csv_reader.deserialize::<Product>().enumerate() {
        // +2 for the header and 0-indexing
        let line = row_index + 2;

        let product = match record {
            Ok(product) => product,
            Err(error) => {
                summary.skipped.push(SkippedRow {
                    line,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        match write_product(&product, &transaction) {
            Ok(()) => summary.imported += 1,
            Err(error) => {
                tracing::warn!("skipping product on line {line}: {error}");
                summary.skipped.push(SkippedRow {
                    line,
                    reason: error.to_string(),
                });
            }
        }
    }

    transaction.commit()?;

    tracing::info!(
        "imported {} products, skipped {} rows",
        summary.imported,
        summary.skipped.len()
    );

    Ok(summary)
}
