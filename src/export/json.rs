//! Writes transactions as a pretty-printed JSON document.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{Email, Error, UserID, auth::AuthUser, transaction::Transaction};

#[derive(Debug, Serialize)]
struct ExportedUser<'a> {
    id: UserID,
    email: &'a Email,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    #[serde(with = "time::serde::rfc3339")]
    exported_at: OffsetDateTime,
    user: ExportedUser<'a>,
    transaction_count: usize,
    transactions: &'a [Transaction],
}

/// Write the transactions of `user` as JSON along with when they were exported.
///
/// # Errors
/// Returns an [Error::JSONSerializationError] if serialization fails.
pub fn transactions_to_json(
    user: &AuthUser,
    transactions: &[Transaction],
    exported_at: OffsetDateTime,
) -> Result<String, Error> {
    let export = JsonExport {
        exported_at,
        user: ExportedUser {
            id: user.user_id,
            email: &user.email,
        },
        transaction_count: transactions.len(),
        transactions,
    };

    serde_json::to_string_pretty(&export)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Email, UserID,
        auth::AuthUser,
        transaction::{Category, Transaction, TransactionType},
    };

    use super::transactions_to_json;

    #[test]
    fn includes_user_and_count() {
        let user = AuthUser {
            user_id: UserID::new(7),
            email: Email::new("foo@bar.baz").unwrap(),
        };
        let transactions = [Transaction {
            id: 3,
            user_id: user.user_id,
            value: 42.5,
            transaction_type: TransactionType::Expense,
            category: Category::Food,
            description: "Lunch".to_owned(),
            date: time::macros::date!(2025 - 10 - 05),
            created_at: OffsetDateTime::now_utc(),
        }];

        let exported = transactions_to_json(
            &user,
            &transactions,
            datetime!(2025-10-06 12:00:00 UTC),
        )
        .unwrap();

        assert!(exported.contains('\n'), "want pretty-printed JSON");
        let exported: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(exported["exportedAt"], "2025-10-06T12:00:00Z");
        assert_eq!(exported["user"], json!({ "id": 7, "email": "foo@bar.baz" }));
        assert_eq!(exported["transactionCount"], 1);
        assert_eq!(exported["transactions"][0]["description"], "Lunch");
        assert_eq!(exported["transactions"][0]["type"], "expense");
    }
}
