//! Reduces a set of transactions to income, expense and per-category totals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::transaction::{Category, Transaction, TransactionType};

/// The overall totals of a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Total income minus total expenses.
    pub balance: f64,
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expense: f64,
    /// The number of transactions that were summed.
    pub transaction_count: usize,
}

/// The total and number of transactions for one category of one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category the transactions belong to.
    pub category: Category,
    /// Whether the transactions are income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The sum of the transaction values.
    pub total: f64,
    /// The number of transactions.
    pub count: usize,
}

/// Sum `transactions` overall and grouped by type and category.
///
/// Groups are ordered by type, income first, then by category name.
pub fn summarize(transactions: &[Transaction]) -> (Totals, Vec<CategoryTotal>) {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut groups: BTreeMap<(TransactionType, &'static str), CategoryTotal> = BTreeMap::new();

    for transaction in transactions {
        match transaction.transaction_type {
            TransactionType::Income => total_income += transaction.value,
            TransactionType::Expense => total_expense += transaction.value,
        }

        let group = groups
            .entry((transaction.transaction_type, transaction.category.as_str()))
            .or_insert_with(|| CategoryTotal {
                category: transaction.category,
                transaction_type: transaction.transaction_type,
                total: 0.0,
                count: 0,
            });
        group.total += transaction.value;
        group.count += 1;
    }

    let totals = Totals {
        balance: total_income - total_expense,
        total_income,
        total_expense,
        transaction_count: transactions.len(),
    };

    (totals, groups.into_values().collect())
}
