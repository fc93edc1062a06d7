//! The route handler for the income and expense summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    auth::AuthUser,
    period::DateRange,
    summary::aggregation::{CategoryTotal, Totals, summarize},
    timezone::get_local_date,
    transaction::{TransactionFilter, get_transactions, parse_optional_date},
};

/// The state needed to summarize a user's transactions.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Which transactions to include in a summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    /// The current calendar month.
    #[default]
    Month,
    /// The current calendar year.
    Year,
    /// The dates given by `startDate` and `endDate`.
    Custom,
    /// Every transaction. Unrecognised periods also mean all transactions.
    #[serde(other)]
    All,
}

impl SummaryPeriod {
    /// The inclusive date range for this period, or `None` if unbounded.
    fn date_range(
        self,
        today: Date,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> Result<Option<DateRange>, Error> {
        match self {
            SummaryPeriod::Month => Ok(Some(DateRange::month_of(today))),
            SummaryPeriod::Year => Ok(Some(DateRange::year_of(today))),
            SummaryPeriod::Custom => DateRange::from_required_bounds(start_date, end_date).map(Some),
            SummaryPeriod::All => Ok(None),
        }
    }
}

/// The query parameters for a summary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    /// Defaults to [SummaryPeriod::Month].
    pub period: Option<SummaryPeriod>,
    /// The first date of a custom period.
    pub start_date: Option<String>,
    /// The last date of a custom period.
    pub end_date: Option<String>,
}

/// The date bounds a summary covers, `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodRange {
    start: Option<Date>,
    end: Option<Date>,
}

impl From<Option<DateRange>> for PeriodRange {
    fn from(range: Option<DateRange>) -> Self {
        Self {
            start: range.map(|range| range.start),
            end: range.map(|range| range.end),
        }
    }
}

/// The overall totals plus the period they cover.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    #[serde(flatten)]
    totals: Totals,
    period: SummaryPeriod,
    period_range: PeriodRange,
}

/// The response body for a summary request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    summary: SummaryTotals,
    by_category: Vec<CategoryTotal>,
}

/// A route handler for summarizing the authenticated user's transactions over a period.
pub async fn get_summary(
    State(state): State<SummaryState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, Error> {
    let Query(query) = query?;
    let period = query.period.unwrap_or_default();

    let start_date = parse_optional_date(query.start_date.as_deref())?;
    let end_date = parse_optional_date(query.end_date.as_deref())?;
    let today = get_local_date(&state.local_timezone)?;
    let range = period.date_range(today, start_date, end_date)?;

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

    let (totals, by_category) = summarize(&transactions);

    Ok(Json(SummaryResponse {
        summary: SummaryTotals {
            totals,
            period,
            period_range: range.into(),
        },
        by_category,
    }))
}
