//! Period summaries over a user's transactions.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Category, Transaction, TransactionType};

/// Expense total for one category within the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category_id: Uuid,
    pub category_name: String,
    pub color: Option<String>,
    pub amount: f64,
    /// Share of total expenses, 0..=100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub expenses: f64,
    pub income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub total_expenses: f64,
    pub total_income: f64,
    pub net_amount: f64,
    pub transaction_count: usize,
    pub category_breakdown: Vec<CategoryShare>,
    pub daily: Vec<DailyTotals>,
}

/// Summarizes the transactions dated within `start..=end`.
///
/// Expenses of categories that no longer exist are reported under
/// "Uncategorized". Days without transactions are omitted from `daily`.
pub fn summarize(
    transactions: &[Transaction],
    categories: &[Category],
    start: NaiveDate,
    end: NaiveDate,
) -> PeriodSummary {
    let names: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut total_expenses = 0.0;
    let mut total_income = 0.0;
    let mut transaction_count = 0;
    let mut by_category: HashMap<Uuid, f64> = HashMap::new();
    let mut by_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|t| t.transaction_date >= start && t.transaction_date <= end)
    {
        transaction_count += 1;
        let day = by_day.entry(transaction.transaction_date).or_default();
        match transaction.kind {
            TransactionType::Expense => {
                total_expenses += transaction.amount;
                day.0 += transaction.amount;
                *by_category.entry(transaction.category_id).or_default() += transaction.amount;
            }
            TransactionType::Income => {
                total_income += transaction.amount;
                day.1 += transaction.amount;
            }
        }
    }

    let mut category_breakdown: Vec<CategoryShare> = by_category
        .into_iter()
        .map(|(category_id, amount)| {
            let category = names.get(&category_id);
            CategoryShare {
                category_id,
                category_name: category
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Uncategorized".to_string()),
                color: category.map(|c| c.color.clone()),
                amount,
                percentage: if total_expenses > 0.0 {
                    amount / total_expenses * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();
    category_breakdown.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    let daily = by_day
        .into_iter()
        .map(|(date, (expenses, income))| DailyTotals {
            date,
            expenses,
            income,
        })
        .collect();

    PeriodSummary {
        total_expenses,
        total_income,
        net_amount: total_income - total_expenses,
        transaction_count,
        category_breakdown,
        daily,
    }
}
