use std::{error::Error, fs::File, path::Path, process::exit};

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use pos_ledger::{delete_product, import_products, initialize_db};

/// A utility for maintaining the product catalog of the point-of-sale ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert or update products from a CSV file with the header `PRD_ID,CODE,NAME,PRICE`.
    Import {
        /// File path to the application SQLite database.
        #[arg(long)]
        db_path: String,

        /// File path to the product CSV.
        csv_path: String,
    },
    /// Delete a product that no transaction detail refers to.
    Delete {
        /// File path to the application SQLite database.
        #[arg(long)]
        db_path: String,

        /// The ID of the product to delete.
        prd_id: i64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Command::Import { db_path, csv_path } => {
            let conn = open_database(Path::new(&db_path))?;
            import(Path::new(&csv_path), &conn)
        }
        Command::Delete { db_path, prd_id } => {
            let conn = open_database(Path::new(&db_path))?;
            delete(prd_id, &conn)
        }
    }
}

fn open_database(db_path: &Path) -> Result<Connection, Box<dyn Error>> {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    println!("Opening database at {db_path:#?}");
    let conn = Connection::open(db_path)?;
    initialize_db(&conn)?;

    Ok(conn)
}

fn import(csv_path: &Path, conn: &Connection) -> Result<(), Box<dyn Error>> {
    if !csv_path.is_file() {
        print_error(format!("File does not exist at {csv_path:#?}!"));
        exit(1);
    }

    let summary = import_products(File::open(csv_path)?, conn)?;

    for skipped in &summary.skipped {
        print_error(format!("Skipped line {}: {}", skipped.line, skipped.reason));
    }

    println!(
        "Imported {} product(s), skipped {} row(s).",
        summary.imported,
        summary.skipped.len()
    );

    Ok(())
}

fn delete(prd_id: i64, conn: &Connection) -> Result<(), Box<dyn Error>> {
    match delete_product(prd_id, conn) {
        Ok(()) => {
            println!("Deleted product {prd_id}.");
            Ok(())
        }
        Err(error @ (pos_ledger::Error::ProductNotFound | pos_ledger::Error::ProductInUse(_))) => {
            print_error(error);
            exit(1);
        }
        Err(error) => Err(error.into()),
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
