//! Defines the endpoint for listing a page of the user's transactions.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::AuthUser,
    pagination::{PageRequest, Pagination, PaginationConfig},
    transaction::{
        Transaction, parse_optional_date,
        query::{TransactionFilter, count_transactions, get_transactions},
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config for paging the list of transactions.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for paging and filtering transactions.
///
/// Empty filter values are treated as if they were not given.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// The page number, starting from 1.
    pub page: Option<u64>,
    /// The maximum number of transactions per page.
    pub limit: Option<u64>,
    /// Only list "income" or "expense" transactions.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Only list transactions in this category.
    pub category: Option<String>,
    /// Only list transactions on or after this date.
    pub start_date: Option<String>,
    /// Only list transactions on or before this date.
    pub end_date: Option<String>,
}

impl TransactionsQuery {
    fn filter(&self) -> Result<TransactionFilter, Error> {
        Ok(TransactionFilter {
            transaction_type: parse_non_empty(self.transaction_type.as_deref())?,
            category: parse_non_empty(self.category.as_deref())?,
            start_date: parse_optional_date(self.start_date.as_deref())?,
            end_date: parse_optional_date(self.end_date.as_deref())?,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_non_empty<T>(value: Option<&str>) -> Result<Option<T>, Error>
where
    T: FromStr<Err = Error>,
{
    non_empty(value).map(str::parse).transpose()
}

/// A page of transactions.
#[derive(Debug, Serialize)]
pub struct TransactionsPage {
    transactions: Vec<Transaction>,
    pagination: Pagination,
}

/// A route handler for listing the authenticated user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionsState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionsPage>, Error> {
    let Query(query) = query?;

    let page_request = PageRequest::resolve(query.page, query.limit, &state.pagination_config)?;
    let filter = query.filter()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let total = count_transactions(user.user_id, &filter, &connection)?;
    let transactions = get_transactions(user.user_id, &filter, Some(page_request), &connection)?;

    Ok(Json(TransactionsPage {
        transactions,
        pagination: Pagination::new(page_request, total),
    }))
}

#[cfg(test)]
mod list_transactions_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::{Duration, macros::date};

    use crate::{
        endpoints,
        test_utils::{create_user_with_token, get_test_app_state, get_test_server},
        transaction::{Category, Transaction, TransactionType, create_transaction},
    };

    #[tokio::test]
    async fn returns_first_page_by_default() {
        let state = get_test_app_state();
        let (user, token) = create_user_with_token(&state, "foo@bar.baz");
        {
            let connection = state.db_connection.lock().unwrap();
            let start = date!(2025 - 01 - 01);
            for i in 0..15 {
                create_transaction(
                    Transaction::build(
                        (i + 1) as f64,
                        TransactionType::Expense,
                        Category::Food,
                        start + Duration::days(i),
                    ),
                    user.id,
                    &connection,
                )
                .unwrap();
            }
        }
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["transactions"].as_array().map(Vec::len), Some(10));
        assert_eq!(body["transactions"][0]["date"], "2025-01-15");
        assert_eq!(
            body["pagination"],
            json!({ "page": 1, "limit": 10, "total": 15, "pages": 2 })
        );
    }

    #[tokio::test]
    async fn filters_by_query_parameters() {
        let state = get_test_app_state();
        let (user, token) = create_user_with_token(&state, "foo@bar.baz");
        {
            let connection = state.db_connection.lock().unwrap();
            for (transaction_type, category, date) in [
                (TransactionType::Income, Category::Salary, date!(2025 - 01 - 10)),
                (TransactionType::Expense, Category::Food, date!(2025 - 01 - 11)),
                (TransactionType::Expense, Category::Food, date!(2025 - 02 - 11)),
                (TransactionType::Expense, Category::Bills, date!(2025 - 01 - 12)),
            ] {
                create_transaction(
                    Transaction::build(10.0, transaction_type, category, date),
                    user.id,
                    &connection,
                )
                .unwrap();
            }
        }
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .add_query_param("type", "expense")
            .add_query_param("category", "food")
            .add_query_param("startDate", "2025-01-01")
            .add_query_param("endDate", "2025-01-31")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["transactions"][0]["date"], "2025-01-11");
    }

    #[tokio::test]
    async fn ignores_empty_filters() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .add_query_param("type", "")
            .add_query_param("category", "")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn does_not_list_other_users_transactions() {
        let state = get_test_app_state();
        let (other_user, _) = create_user_with_token(&state, "other@bar.baz");
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        create_transaction(
            Transaction::build(
                10.0,
                TransactionType::Expense,
                Category::Food,
                date!(2025 - 01 - 10),
            ),
            other_user.id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["transactions"], json!([]));
    }

    #[tokio::test]
    async fn rejects_oversized_limit() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .add_query_param("limit", "1000")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .add_query_param("category", "groceries")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_page_too_large_to_offset() {
        let state = get_test_app_state();
        let (_, token) = create_user_with_token(&state, "foo@bar.baz");
        let server = get_test_server(state);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .add_query_param("page", "18446744073709551615")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "page is too large" }));
    }
}
