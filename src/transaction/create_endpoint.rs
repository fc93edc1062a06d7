//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    AppState, Error,
    auth::AuthUser,
    timezone::get_local_date,
    transaction::{Transaction, core::create_transaction, parse_optional_date},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The JSON body for creating a transaction.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    /// The amount of money, either a JSON number or a numeric string.
    pub value: Option<Value>,
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// One of the categories allowed for the transaction type.
    pub category: Option<String>,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The date of the transaction, defaults to today in the local timezone.
    pub date: Option<String>,
}

/// The response sent after creating a transaction.
#[derive(Debug, Serialize)]
pub struct CreatedTransaction {
    message: &'static str,
    transaction: Transaction,
}

/// A route handler for creating a new transaction owned by the authenticated user.
///
/// Responds with 201 Created and the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user): Extension<AuthUser>,
    form: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedTransaction>), Error> {
    let Json(form) = form?;

    let (Some(raw_value), Some(raw_type), Some(raw_category)) =
        (form.value, form.transaction_type, form.category)
    else {
        return Err(Error::Validation(
            "value, type and category are required".to_owned(),
        ));
    };

    let value = parse_value(&raw_value)?;
    let transaction_type = raw_type.trim().parse()?;
    let category = raw_category.trim().parse()?;
    let date = match parse_optional_date(form.date.as_deref())? {
        Some(date) => date,
        None => get_local_date(&state.local_timezone)?,
    };
    let description = form.description.as_deref().map(str::trim).unwrap_or_default();

    let builder = Transaction::build(value, transaction_type, category, date).description(description);

    let transaction = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_transaction(builder, user.user_id, &connection)?
    };

    tracing::debug!(
        "Created transaction {} for user {}",
        transaction.id,
        user.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedTransaction {
            message: "Transaction created successfully",
            transaction,
        }),
    ))
}

/// Read the transaction value from a JSON number or a numeric string like "12.50".
fn parse_value(raw_value: &Value) -> Result<f64, Error> {
    let value = match raw_value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    value.ok_or_else(|| Error::Validation("value must be a number".to_owned()))
}

#[cfg(test)]
mod create_transaction_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        test_utils::{create_user_with_token, get_test_app_state, get_test_server},
    };

    use super::parse_value;

    #[test]
    fn parse_value_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_value(&json!(12.5)), Ok(12.5));
        assert_eq!(parse_value(&json!("12.5")), Ok(12.5));
        assert!(parse_value(&json!("twelve")).is_err());
        assert!(parse_value(&json!(null)).is_err());
    }

    #[tokio::test]
    async fn creates_transaction() {
        let state = get_test_app_state();
        let (user, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({
                "value": "1500.00",
                "type": "income",
                "category": "salary",
                "description": "  October salary ",
                "date": "2025-10-05",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Transaction created successfully");
        let transaction = &body["transaction"];
        assert!(transaction["id"].as_i64().is_some_and(|id| id > 0));
        assert_eq!(transaction["userId"], user.id.as_i64());
        assert_eq!(transaction["value"], 1500.0);
        assert_eq!(transaction["type"], "income");
        assert_eq!(transaction["category"], "salary");
        assert_eq!(transaction["description"], "October salary");
        assert_eq!(transaction["date"], "2025-10-05");
    }

    #[tokio::test]
    async fn date_defaults_to_today() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({ "value": 10, "type": "expense", "category": "food" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let today = OffsetDateTime::now_utc().date().to_string();
        assert_eq!(response.json::<Value>()["transaction"]["date"], today);
    }

    #[tokio::test]
    async fn rejects_category_for_wrong_type() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({ "value": 10, "type": "expense", "category": "salary" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let message = response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .to_owned();
        assert!(message.contains("food"), "got error message {message}");
    }

    #[tokio::test]
    async fn rejects_non_positive_value() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({ "value": -5, "type": "expense", "category": "food" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_value_that_would_overflow_totals() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({ "value": 1.0e308, "type": "income", "category": "salary" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_missing_fields() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .json(&json!({ "value": 5 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "value, type and category are required" }));
    }

    #[tokio::test]
    async fn rejects_unauthenticated_request() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "value": 5, "type": "expense", "category": "food" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
