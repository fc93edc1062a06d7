use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finfly::{
    Category, Email, NewUser, PasswordHash, Transaction, TransactionType, ValidatedPassword,
    create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of finfly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The email of the demo user.
    #[arg(long, default_value = "demo@finfly.app")]
    email: String,

    /// The password of the demo user.
    #[arg(long, default_value = "finfly-demo-password")]
    password: String,
}

/// Monthly income and expenses for the demo user as (value, type, category, description).
const MONTHLY_TRANSACTIONS: [(f64, TransactionType, Category, &str); 8] = [
    (5200.0, TransactionType::Income, Category::Salary, "Salary"),
    (850.0, TransactionType::Income, Category::Freelance, "Website project"),
    (1450.0, TransactionType::Expense, Category::Bills, "Rent"),
    (230.75, TransactionType::Expense, Category::Bills, "Electricity and water"),
    (612.4, TransactionType::Expense, Category::Food, "Groceries"),
    (180.0, TransactionType::Expense, Category::Transport, "Fuel"),
    (95.9, TransactionType::Expense, Category::Leisure, "Cinema and dinner"),
    (320.0, TransactionType::Expense, Category::Education, "English course"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user {}...", args.email);

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(&args.password),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            name: "Demo User".to_owned(),
            email: Email::new(&args.email)?,
            password_hash,
        },
        &conn,
    )?;

    println!("Creating transactions for the last six months...");

    let today = OffsetDateTime::now_utc().date();

    for month in 0..6 {
        let month_start = today - Duration::days(30 * month);

        for (day, (value, transaction_type, category, description)) in
            MONTHLY_TRANSACTIONS.into_iter().enumerate()
        {
            let date = month_start - Duration::days(day as i64 * 3);
            let builder = Transaction::build(value, transaction_type, category, date)
                .description(description);

            create_transaction(builder, user.id, &conn)?;
        }
    }

    println!("Success!");

    Ok(())
}
