use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Budget, BudgetStatus, NewBudget, Paginated};
use crate::period::MonthRange;
use crate::transport::ApiRequest;
use std::sync::Arc;

/// Access to `/api/budgets/`
pub struct BudgetRepository {
    client: Arc<ApiClient>,
}

impl BudgetRepository {
    /// Create a new BudgetRepository
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Budgets defined for a `YYYY-MM` month
    pub async fn list(&self, month: &str) -> ApiResult<Vec<Budget>> {
        let month = MonthRange::parse(month)?.month();
        let data = self
            .client
            .execute_value(ApiRequest::get("/api/budgets/").with_query([("month", month)]))
            .await?;
        Ok(Paginated::normalize(data)?.results)
    }

    pub async fn create(&self, budget: &NewBudget) -> ApiResult<Budget> {
        MonthRange::parse(&budget.month)?;
        self.client
            .execute_json(ApiRequest::post("/api/budgets/").with_json(budget)?)
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .execute(ApiRequest::delete(format!("/api/budgets/{}/", id)))
            .await?;
        Ok(())
    }

    /// Spending against every budget of the month
    pub async fn status(&self, month: &str) -> ApiResult<BudgetStatus> {
        let month = MonthRange::parse(month)?.month();
        self.client
            .execute_json(ApiRequest::get("/api/budgets/status/").with_query([("month", month)]))
            .await
    }
}
