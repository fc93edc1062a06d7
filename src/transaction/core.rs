//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, UserID, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned, e.g. wages.
    Income,
    /// Money that was spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The string used for this type in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The categories that a transaction of this type may be assigned.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            TransactionType::Income => &[
                Category::Salary,
                Category::Freelance,
                Category::Investment,
                Category::Gift,
                Category::Others,
            ],
            TransactionType::Expense => &[
                Category::Food,
                Category::Transport,
                Category::Leisure,
                Category::Health,
                Category::Education,
                Category::Shopping,
                Category::Bills,
                Category::Others,
            ],
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(Error::Validation(
                "type must be \"income\" or \"expense\"".to_owned(),
            )),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// What a transaction was for.
///
/// Each [TransactionType] only allows a subset of categories, see [TransactionType::categories].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Income from employment.
    Salary,
    /// Income from contract work.
    Freelance,
    /// Income from dividends, interest, etc.
    Investment,
    /// Money received as a gift.
    Gift,
    /// Groceries and eating out.
    Food,
    /// Fuel, public transport, etc.
    Transport,
    /// Entertainment and hobbies.
    Leisure,
    /// Medical costs.
    Health,
    /// Courses, books and tuition.
    Education,
    /// General purchases.
    Shopping,
    /// Utilities, rent and other recurring bills.
    Bills,
    /// Anything else. Valid for both income and expenses.
    Others,
}

impl Category {
    const ALL: [Category; 12] = [
        Category::Salary,
        Category::Freelance,
        Category::Investment,
        Category::Gift,
        Category::Food,
        Category::Transport,
        Category::Leisure,
        Category::Health,
        Category::Education,
        Category::Shopping,
        Category::Bills,
        Category::Others,
    ];

    /// The string used for this category in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Salary => "salary",
            Category::Freelance => "freelance",
            Category::Investment => "investment",
            Category::Gift => "gift",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Leisure => "leisure",
            Category::Health => "health",
            Category::Education => "education",
            Category::Shopping => "shopping",
            Category::Bills => "bills",
            Category::Others => "others",
        }
    }

    /// Whether a transaction of type `transaction_type` may use this category.
    pub fn is_valid_for(&self, transaction_type: TransactionType) -> bool {
        transaction_type.categories().contains(self)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("\"{s}\" is not a valid category")))
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// An income or expense, i.e. an event where money was either earned or spent.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
    /// The amount of money earned or spent. Always greater than zero.
    pub value: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// What the transaction was for.
    pub category: Category,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        value: f64,
        transaction_type: TransactionType,
        category: Category,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            value,
            transaction_type,
            category,
            date,
            description: String::new(),
        }
    }
}

/// The largest value a single transaction may have.
///
/// Sums over any number of stored transactions stay finite below this bound.
pub const MAX_TRANSACTION_VALUE: f64 = 1_000_000_000_000.0;

/// A builder for creating [Transaction] instances.
///
/// The builder is checked by [create_transaction] before anything is written
/// to the database.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The amount of money earned or spent, must be greater than zero.
    pub value: f64,
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// Must be one of `transaction_type`'s categories.
    pub category: Category,
    /// When the transaction happened.
    pub date: Date,
    /// Free text describing the transaction, empty if not given.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Check the value and category of the transaction.
    ///
    /// # Errors
    /// Returns an [Error::Validation] if the value is not a positive number,
    /// exceeds [MAX_TRANSACTION_VALUE], or if the category is not valid for the
    /// transaction type.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(Error::Validation(
                "value must be greater than zero".to_owned(),
            ));
        }

        if self.value > MAX_TRANSACTION_VALUE {
            return Err(Error::Validation(format!(
                "value must not be greater than {MAX_TRANSACTION_VALUE}"
            )));
        }

        if !self.category.is_valid_for(self.transaction_type) {
            let valid_categories = self
                .transaction_type
                .categories()
                .iter()
                .map(Category::as_str)
                .collect::<Vec<_>>()
                .join(", ");

            return Err(Error::Validation(format!(
                "invalid category \"{}\" for {}. Valid categories for {}: {}",
                self.category, self.transaction_type, self.transaction_type, valid_categories
            )));
        }

        Ok(())
    }
}

/// Parse a date sent by a client.
///
/// Accepts either a plain date (`2025-01-31`) or an RFC 3339 date-time
/// (`2025-01-31T12:00:00.000Z`), in which case the date part is used.
///
/// # Errors
/// Returns an [Error::Validation] if `raw_date` is in neither format.
pub fn parse_date(raw_date: &str) -> Result<Date, Error> {
    let raw_date = raw_date.trim();

    Date::parse(raw_date, format_description!("[year]-[month]-[day]"))
        .or_else(|_| OffsetDateTime::parse(raw_date, &Rfc3339).map(|date_time| date_time.date()))
        .map_err(|_| Error::Validation(format!("\"{raw_date}\" is not a valid date")))
}

/// Parse an optional date from a query string, treating an empty value as absent.
///
/// # Errors
/// Returns an [Error::Validation] if a non-empty `raw_date` is not a valid date.
pub fn parse_optional_date(raw_date: Option<&str>) -> Result<Option<Date>, Error> {
    raw_date
        .filter(|raw_date| !raw_date.trim().is_empty())
        .map(parse_date)
        .transpose()
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction owned by `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the builder fails [TransactionBuilder::validate],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, value, type, category, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, value, type, category, description, date, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.value,
                builder.transaction_type,
                builder.category,
                builder.description,
                builder.date,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, value, type, category, description, date, created_at \
            FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` if it is owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                value REAL NOT NULL CHECK (value > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every query is scoped to a user and most filter or sort by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns `id, user_id, value, type, category, description, date, created_at` in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        value: row.get(2)?,
        transaction_type: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod model_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{Category, Transaction, TransactionType, parse_optional_date},
    };

    use super::{MAX_TRANSACTION_VALUE, parse_date};

    #[test]
    fn others_is_valid_for_both_types() {
        assert!(Category::Others.is_valid_for(TransactionType::Income));
        assert!(Category::Others.is_valid_for(TransactionType::Expense));
    }

    #[test]
    fn salary_is_not_an_expense_category() {
        assert!(!Category::Salary.is_valid_for(TransactionType::Expense));
    }

    #[test]
    fn food_is_not_an_income_category() {
        assert!(!Category::Food.is_valid_for(TransactionType::Income));
    }

    #[test]
    fn every_category_parses_from_its_string() {
        for category in TransactionType::Income
            .categories()
            .iter()
            .chain(TransactionType::Expense.categories())
        {
            assert_eq!(category.as_str().parse::<Category>(), Ok(*category));
        }
    }

    #[test]
    fn unknown_category_fails_to_parse() {
        assert!(matches!(
            "groceries".parse::<Category>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        assert!(matches!(
            "transfer".parse::<TransactionType>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_value() {
        let builder = Transaction::build(
            0.0,
            TransactionType::Expense,
            Category::Food,
            date!(2025 - 01 - 01),
        );

        assert!(matches!(builder.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn validate_rejects_negative_value() {
        let builder = Transaction::build(
            -12.5,
            TransactionType::Expense,
            Category::Food,
            date!(2025 - 01 - 01),
        );

        assert!(matches!(builder.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_finite_value() {
        let builder = Transaction::build(
            f64::NAN,
            TransactionType::Income,
            Category::Salary,
            date!(2025 - 01 - 01),
        );

        assert!(matches!(builder.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn validate_rejects_value_above_maximum() {
        let builder = Transaction::build(
            f64::MAX,
            TransactionType::Income,
            Category::Salary,
            date!(2025 - 01 - 01),
        );

        assert!(matches!(builder.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn validate_accepts_maximum_value() {
        let builder = Transaction::build(
            MAX_TRANSACTION_VALUE,
            TransactionType::Income,
            Category::Salary,
            date!(2025 - 01 - 01),
        );

        assert_eq!(builder.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_category_from_other_type() {
        let builder = Transaction::build(
            100.0,
            TransactionType::Income,
            Category::Food,
            date!(2025 - 01 - 01),
        );

        let Err(Error::Validation(message)) = builder.validate() else {
            panic!("want validation error");
        };
        assert!(message.contains("salary, freelance, investment, gift, others"));
    }

    #[test]
    fn validate_accepts_valid_transaction() {
        let builder = Transaction::build(
            100.0,
            TransactionType::Income,
            Category::Salary,
            date!(2025 - 01 - 01),
        );

        assert_eq!(builder.validate(), Ok(()));
    }

    #[test]
    fn parse_date_accepts_plain_date() {
        assert_eq!(parse_date("2025-03-09"), Ok(date!(2025 - 03 - 09)));
    }

    #[test]
    fn parse_date_accepts_date_time() {
        assert_eq!(
            parse_date("2025-03-09T14:30:00.000Z"),
            Ok(date!(2025 - 03 - 09))
        );
    }

    #[test]
    fn parse_optional_date_treats_empty_as_absent() {
        assert_eq!(parse_optional_date(Some("  ")), Ok(None));
        assert_eq!(parse_optional_date(None), Ok(None));
        assert_eq!(
            parse_optional_date(Some("2025-03-09")),
            Ok(Some(date!(2025 - 03 - 09)))
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(parse_date("09/03/2025"), Err(Error::Validation(_))));
    }
}
