use crate::error::AppResult;
use crate::models::{
    self, new_id, parse_id,
    expense::{Expense, ExpenseInput, ExpenseSummary},
    trip::TripCollection,
};
use crate::services::trip_service::TripService;

impl TripService {
    pub async fn add_expense(
        &self,
        trip_id: &str,
        user_id: &str,
        input: ExpenseInput,
    ) -> AppResult<Expense> {
        input.validate()?;
        let trip = self.load(trip_id, user_id).await?;
        let expense = input.into_expense(new_id(), models::now());
        self.push_item(&trip, TripCollection::Expenses, &expense)
            .await?;
        Ok(expense)
    }

    pub async fn list_expenses(&self, trip_id: &str, user_id: &str) -> AppResult<Vec<Expense>> {
        Ok(self.load(trip_id, user_id).await?.expenses)
    }

    pub async fn update_expense(
        &self,
        trip_id: &str,
        expense_id: &str,
        user_id: &str,
        input: ExpenseInput,
    ) -> AppResult<Expense> {
        let expense_id = parse_id(expense_id, "expense")?;
        input.validate()?;
        let trip = self.load(trip_id, user_id).await?;
        let expense = input.into_expense(expense_id.clone(), models::now());
        self.replace_item(
            &trip,
            TripCollection::Expenses,
            &expense_id,
            &expense,
            "Expense not found",
        )
        .await?;
        Ok(expense)
    }

    pub async fn delete_expense(
        &self,
        trip_id: &str,
        expense_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let expense_id = parse_id(expense_id, "expense")?;
        let trip = self.load(trip_id, user_id).await?;
        self.pull_item(&trip, TripCollection::Expenses, &expense_id)
            .await
    }

    pub async fn expense_summary(&self, trip_id: &str, user_id: &str) -> AppResult<ExpenseSummary> {
        let trip = self.load(trip_id, user_id).await?;
        Ok(ExpenseSummary::compute(trip.budget, &trip.expenses))
    }
}
