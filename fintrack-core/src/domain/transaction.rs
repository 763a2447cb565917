//! Transaction domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Whether a transaction adds to or draws from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Storage name, also used in API routes
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// What the label field is called at the API surface
    pub fn label_field(&self) -> &'static str {
        match self {
            TransactionKind::Income => "source",
            TransactionKind::Expense => "category",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::database(format!(
                "unknown transaction kind: {}",
                other
            ))),
        }
    }
}

/// A single income or expense record belonging to a user
///
/// Immutable once created; there is no edit operation, only delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Strictly positive; the kind carries the sign
    pub amount: Decimal,
    /// Income source or expense category
    pub label: String,
    pub date: NaiveDate,
    /// Optional icon reference for the UI
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        kind: TransactionKind,
        amount: Decimal,
        label: impl Into<String>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            kind,
            amount,
            label: label.into(),
            date,
            icon: None,
            created_at: now,
        }
    }
}

/// Validated input for creating a transaction
///
/// The write path owns all record validation; the aggregator assumes
/// every stored record is well formed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// Accepts either `source` (income) or `category` (expense)
    #[serde(alias = "source", alias = "category")]
    pub label: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self, kind: TransactionKind) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::validation(format!(
                "{} is required",
                capitalize(kind.label_field())
            )));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation("Amount must be greater than zero"));
        }
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tx_input(amount: i64) -> NewTransaction {
        NewTransaction {
            label: "Groceries".to_string(),
            amount: Decimal::new(amount, 2),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            icon: None,
        }
    }

    #[test]
    fn test_validation_rejects_non_positive_amount() {
        assert!(new_tx_input(4250).validate(TransactionKind::Expense).is_ok());
        assert!(new_tx_input(0).validate(TransactionKind::Expense).is_err());
        assert!(new_tx_input(-100).validate(TransactionKind::Expense).is_err());
    }

    #[test]
    fn test_validation_rejects_blank_label() {
        let mut input = new_tx_input(4250);
        input.label = "  ".to_string();
        let err = input.validate(TransactionKind::Income).unwrap_err();
        assert!(err.to_string().contains("Source"));
    }

    #[test]
    fn test_input_accepts_source_and_category_aliases() {
        let from_income: NewTransaction =
            serde_json::from_str(r#"{"source":"Salary","amount":"5000","date":"2025-06-01"}"#)
                .unwrap();
        assert_eq!(from_income.label, "Salary");

        let from_expense: NewTransaction =
            serde_json::from_str(r#"{"category":"Rent","amount":"1200","date":"2025-06-01"}"#)
                .unwrap();
        assert_eq!(from_expense.label, "Rent");
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(
            TransactionKind::parse(TransactionKind::Income.as_str()).unwrap(),
            TransactionKind::Income
        );
        assert!(TransactionKind::parse("transfer").is_err());
    }
}
