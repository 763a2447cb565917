//! Dashboard service - transaction aggregation
//!
//! Pure rollups over a user's income and expense lists. The aggregation
//! functions take in-memory snapshots and have no hidden state; the
//! service wrapper only adds the store reads and the response shape the
//! dashboard consumes.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Transaction, TransactionKind};
use crate::ports::{Clock, TransactionStore};

/// How many merged transactions the dashboard shows
const RECENT_COUNT: usize = 5;

/// Overall balance figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub total_balance: Decimal,
}

/// A time-windowed slice with its own total
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowedSection {
    pub total: Decimal,
    pub transactions: Vec<Transaction>,
}

/// Everything the dashboard needs in one response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub last30_days_expenses: WindowedSection,
    pub last60_days_income: WindowedSection,
    pub recent_transactions: Vec<Transaction>,
}

/// Sum both lists and derive the balance. Empty inputs give zeros.
pub fn totals(incomes: &[Transaction], expenses: &[Transaction]) -> Totals {
    let total_income: Decimal = incomes.iter().map(|tx| tx.amount).sum();
    let total_expense: Decimal = expenses.iter().map(|tx| tx.amount).sum();
    Totals {
        total_income,
        total_expense,
        total_balance: total_income - total_expense,
    }
}

/// Transactions dated within the last `days` calendar days of
/// `reference`, boundary day inclusive, most recent first.
///
/// The sort is stable, so equal dates keep their input order.
pub fn windowed(transactions: &[Transaction], days: i64, reference: NaiveDate) -> Vec<Transaction> {
    let start = reference - Duration::days(days);
    let mut window: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.date >= start && tx.date <= reference)
        .cloned()
        .collect();
    window.sort_by(|a, b| b.date.cmp(&a.date));
    window
}

/// The `count` most recent transactions, or fewer if the input is smaller
pub fn recent(transactions: &[Transaction], count: usize) -> Vec<Transaction> {
    let mut sorted: Vec<Transaction> = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(count);
    sorted
}

/// Dashboard service assembling the summary from one snapshot per kind
pub struct DashboardService {
    transactions: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(transactions: Arc<dyn TransactionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { transactions, clock }
    }

    /// Full dashboard rollup for one user
    pub async fn summary(&self, user_id: Uuid) -> Result<DashboardSummary> {
        let incomes = self
            .transactions
            .get_transactions(user_id, TransactionKind::Income)
            .await?;
        let expenses = self
            .transactions
            .get_transactions(user_id, TransactionKind::Expense)
            .await?;

        let today = self.clock.now().date_naive();
        let overall = totals(&incomes, &expenses);

        let last30_expenses = windowed(&expenses, 30, today);
        let last60_income = windowed(&incomes, 60, today);

        let mut merged = incomes;
        merged.extend(expenses);
        let recent_transactions = recent(&merged, RECENT_COUNT);

        Ok(DashboardSummary {
            total_balance: overall.total_balance,
            total_income: overall.total_income,
            total_expense: overall.total_expense,
            last30_days_expenses: WindowedSection {
                total: last30_expenses.iter().map(|tx| tx.amount).sum(),
                transactions: last30_expenses,
            },
            last60_days_income: WindowedSection {
                total: last60_income.iter().map(|tx| tx.amount).sum(),
                transactions: last60_income,
            },
            recent_transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(amount: i64, date: NaiveDate) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TransactionKind::Expense,
            Decimal::new(amount, 2),
            "Misc",
            date,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_totals_empty_inputs_are_zero() {
        let result = totals(&[], &[]);
        assert_eq!(result.total_income, Decimal::ZERO);
        assert_eq!(result.total_expense, Decimal::ZERO);
        assert_eq!(result.total_balance, Decimal::ZERO);
    }

    #[test]
    fn test_totals_balance_is_income_minus_expense() {
        let incomes = vec![tx(10000, day(1))];
        let expenses = vec![tx(4000, day(2))];
        let result = totals(&incomes, &expenses);
        assert_eq!(result.total_income, Decimal::new(10000, 2));
        assert_eq!(result.total_expense, Decimal::new(4000, 2));
        assert_eq!(result.total_balance, Decimal::new(6000, 2));
    }

    #[test]
    fn test_windowed_boundary_is_inclusive() {
        let reference = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        let on_boundary = tx(100, reference - Duration::days(30));
        let past_boundary = tx(200, reference - Duration::days(31));
        let transactions = vec![on_boundary.clone(), past_boundary];

        let window = windowed(&transactions, 30, reference);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, on_boundary.id);
    }

    #[test]
    fn test_windowed_excludes_future_dates() {
        let reference = day(15);
        let transactions = vec![tx(100, day(14)), tx(200, day(16))];
        let window = windowed(&transactions, 30, reference);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].date, day(14));
    }

    #[test]
    fn test_windowed_sorts_date_descending_with_stable_ties() {
        let first = tx(1, day(10));
        let second = tx(2, day(12));
        let third = tx(3, day(10));
        let window = windowed(&[first.clone(), second.clone(), third.clone()], 30, day(15));

        assert_eq!(window[0].id, second.id);
        // Equal dates keep input order
        assert_eq!(window[1].id, first.id);
        assert_eq!(window[2].id, third.id);
    }

    #[test]
    fn test_recent_takes_latest_in_descending_order() {
        let transactions: Vec<Transaction> = (1..=10).map(|d| tx(d as i64, day(d))).collect();
        let top = recent(&transactions, 4);

        assert_eq!(top.len(), 4);
        let dates: Vec<NaiveDate> = top.iter().map(|tx| tx.date).collect();
        assert_eq!(dates, vec![day(10), day(9), day(8), day(7)]);
    }

    #[test]
    fn test_recent_returns_fewer_when_input_is_small() {
        let transactions = vec![tx(1, day(1))];
        assert_eq!(recent(&transactions, 4).len(), 1);
        assert!(recent(&[], 4).is_empty());
    }

    #[test]
    fn test_windowed_is_pure() {
        let transactions = vec![tx(1, day(1)), tx(2, day(2))];
        let first = windowed(&transactions, 30, day(15));
        let second = windowed(&transactions, 30, day(15));
        assert_eq!(first.len(), second.len());
        // Input untouched
        assert_eq!(transactions[0].date, day(1));
    }
}
