use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Accommodation,
    Food,
    Transport,
    Entertainment,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub title: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExpenseInput {
    pub fn validate(&self) -> AppResult<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(AppError::InvalidInput(
                "Expense amount must be a non-negative amount".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_expense(self, id: String, now: DateTime<Utc>) -> Expense {
        Expense {
            id,
            title: self.title,
            amount: self.amount,
            category: self.category,
            date: self.date.unwrap_or(now),
            notes: self.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ExpenseSummary {
    pub budget: f64,
    pub total_spent: f64,
    pub remaining: f64,
    pub category_breakdown: BTreeMap<ExpenseCategory, f64>,
}

impl ExpenseSummary {
    pub fn compute(budget: f64, expenses: &[Expense]) -> Self {
        let mut category_breakdown = BTreeMap::new();
        let mut total_spent = 0.0;
        for expense in expenses {
            total_spent += expense.amount;
            *category_breakdown.entry(expense.category).or_insert(0.0) += expense.amount;
        }

        Self {
            budget,
            total_spent,
            remaining: budget - total_spent,
            category_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, category: ExpenseCategory) -> Expense {
        Expense {
            id: crate::models::new_id(),
            title: "x".to_string(),
            amount,
            category,
            date: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn summary_totals_and_breakdown() {
        let expenses = vec![
            expense(100.0, ExpenseCategory::Food),
            expense(50.0, ExpenseCategory::Food),
            expense(30.0, ExpenseCategory::Transport),
        ];
        let summary = ExpenseSummary::compute(500.0, &expenses);

        assert_eq!(summary.total_spent, 180.0);
        assert_eq!(summary.remaining, 320.0);
        assert_eq!(summary.category_breakdown.len(), 2);
        assert_eq!(summary.category_breakdown[&ExpenseCategory::Food], 150.0);
        assert_eq!(summary.category_breakdown[&ExpenseCategory::Transport], 30.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["category_breakdown"]["food"], 150.0);
    }

    #[test]
    fn empty_summary_keeps_whole_budget() {
        let summary = ExpenseSummary::compute(250.0, &[]);
        assert_eq!(summary.total_spent, 0.0);
        assert_eq!(summary.remaining, 250.0);
        assert!(summary.category_breakdown.is_empty());
    }

    #[test]
    fn missing_date_defaults_to_now() {
        let now = Utc::now();
        let input: ExpenseInput = serde_json::from_value(serde_json::json!({
            "title": "Dinner", "amount": 42.5, "category": "food"
        }))
        .unwrap();
        assert_eq!(input.into_expense("id".to_string(), now).date, now);
    }
}
