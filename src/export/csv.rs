//! Writes transactions as a spreadsheet friendly CSV document.
//!
//! Headers, dates, types and values follow Brazilian Portuguese conventions,
//! e.g. `05/10/2025,Despesa,food,Almoço,"42,50"`.

use csv::Writer;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    transaction::{Transaction, TransactionType},
};

/// The header row of exported CSV documents.
pub const CSV_HEADER: [&str; 5] = ["Data", "Tipo", "Categoria", "Descrição", "Valor"];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// Write `transactions` as CSV, one row per transaction after the header row.
///
/// # Errors
/// Returns an [Error::CsvError] if a row could not be written.
pub fn transactions_to_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for transaction in transactions {
        let date = format_date(transaction.date)?;
        let value = format_value(transaction.value);

        writer
            .write_record([
                date.as_str(),
                type_label(transaction.transaction_type),
                transaction.category.as_str(),
                transaction.description.as_str(),
                value.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}

fn csv_error(error: csv::Error) -> Error {
    Error::CsvError(error.to_string())
}

fn format_date(date: Date) -> Result<String, Error> {
    date.format(DATE_FORMAT)
        .map_err(|error| Error::CsvError(error.to_string()))
}

fn type_label(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => "Receita",
        TransactionType::Expense => "Despesa",
    }
}

/// Format `value` with two decimal places and a decimal comma, e.g. `1234,56`.
fn format_value(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}
