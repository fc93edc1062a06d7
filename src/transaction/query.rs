//! Filtered and paginated queries over a user's transactions.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{Error, UserID, pagination::PageRequest, period::DateRange};

use super::core::{Category, Transaction, TransactionType, map_transaction_row};

/// Optional constraints on which of a user's transactions to select.
///
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only select transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Only select transactions in this category.
    pub category: Option<Category>,
    /// Only select transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only select transactions on or before this date.
    pub end_date: Option<Date>,
}

impl TransactionFilter {
    /// A filter that selects every transaction within `range`, or every
    /// transaction if `range` is `None`.
    pub fn in_range(range: Option<DateRange>) -> Self {
        Self {
            start_date: range.map(|range| range.start),
            end_date: range.map(|range| range.end),
            ..Default::default()
        }
    }

    /// Build the SQL `WHERE` clause and its positional parameters for this filter.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut conditions = vec!["user_id = ?".to_owned()];
        let mut params = vec![Value::Integer(user_id.as_i64())];

        if let Some(transaction_type) = self.transaction_type {
            conditions.push("type = ?".to_owned());
            params.push(Value::Text(transaction_type.as_str().to_owned()));
        }

        if let Some(category) = self.category {
            conditions.push("category = ?".to_owned());
            params.push(Value::Text(category.as_str().to_owned()));
        }

        // Dates are stored as ISO 8601 text, so string comparison orders them correctly.
        if let Some(start_date) = self.start_date {
            conditions.push("date >= ?".to_owned());
            params.push(Value::Text(start_date.to_string()));
        }

        if let Some(end_date) = self.end_date {
            conditions.push("date <= ?".to_owned());
            params.push(Value::Text(end_date.to_string()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Count the transactions owned by `user_id` that match `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause(user_id);
    let query = format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}");

    let count: i64 = connection.query_row(&query, params_from_iter(params), |row| row.get(0))?;

    u64::try_from(count)
        .map_err(|_| Error::SqlError(rusqlite::Error::IntegralValueOutOfRange(0, count)))
}

/// Get the transactions owned by `user_id` that match `filter`, newest first.
///
/// Transactions on the same date are ordered by ID, newest first, to keep the
/// order stable across pages. If `page` is `None` all matching transactions
/// are returned.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    page: Option<PageRequest>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut params) = filter.where_clause(user_id);

    let mut query = format!(
        "SELECT id, user_id, value, type, category, description, date, created_at \
        FROM \"transaction\" {where_clause} ORDER BY date DESC, id DESC"
    );

    if let Some(page) = page {
        query.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(to_sql_integer(page.limit)));
        params.push(Value::Integer(to_sql_integer(page.offset())));
    }

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

fn to_sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
