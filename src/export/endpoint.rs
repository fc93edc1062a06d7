//! The route handler for downloading a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State, rejection::QueryRejection},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::AuthUser,
    export::{csv::transactions_to_csv, json::transactions_to_json},
    period::DateRange,
    timezone::get_local_date,
    transaction::{TransactionFilter, get_transactions, parse_optional_date},
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The file format of an export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma separated values for spreadsheets.
    #[default]
    Csv,
    /// A JSON document.
    Json,
}

impl ExportFormat {
    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Which transactions to export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportRange {
    /// Every transaction.
    #[default]
    All,
    /// The current calendar month.
    Month,
    /// The current calendar year.
    Year,
    /// The last three months up to and including today.
    Last3,
    /// The dates given by `startDate` and `endDate`.
    Custom,
}

impl ExportRange {
    fn date_range(
        self,
        today: Date,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> Result<Option<DateRange>, Error> {
        match self {
            ExportRange::All => Ok(None),
            ExportRange::Month => Ok(Some(DateRange::month_of(today))),
            ExportRange::Year => Ok(Some(DateRange::year_of(today))),
            ExportRange::Last3 => Ok(Some(DateRange::months_up_to(today, 3))),
            ExportRange::Custom => DateRange::from_required_bounds(start_date, end_date).map(Some),
        }
    }
}

/// The query parameters for an export.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    /// Defaults to [ExportFormat::Csv].
    #[serde(rename = "type")]
    pub format: Option<ExportFormat>,
    /// Defaults to [ExportRange::All].
    pub range: Option<ExportRange>,
    /// The first date of a custom range.
    pub start_date: Option<String>,
    /// The last date of a custom range.
    pub end_date: Option<String>,
}

/// A route handler for downloading the authenticated user's transactions as a CSV or JSON file.
pub async fn export_transactions(
    State(state): State<ExportState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let format = query.format.unwrap_or_default();

    let start_date = parse_optional_date(query.start_date.as_deref())?;
    let end_date = parse_optional_date(query.end_date.as_deref())?;
    let today = get_local_date(&state.local_timezone)?;
    let range = query
        .range
        .unwrap_or_default()
        .date_range(today, start_date, end_date)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(
            user.user_id,
            &TransactionFilter::in_range(range),
            None,
            &connection,
        )?
    };

    let exported_at = OffsetDateTime::now_utc();
    let body = match format {
        ExportFormat::Csv => transactions_to_csv(&transactions)?,
        ExportFormat::Json => transactions_to_json(&user, &transactions, exported_at)?,
    };

    let filename = format!(
        "finfly-export-{}.{}",
        exported_at.unix_timestamp_nanos() / 1_000_000,
        format.extension()
    );
    tracing::info!(
        "Exported {} transactions for user {} as {filename}",
        transactions.len(),
        user.user_id
    );

    Ok((
        [
            (CONTENT_TYPE, format.content_type().to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
