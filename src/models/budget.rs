use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::report::lenient_decimal;

/// Whether a budget caps all spending or a single category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetScope {
    Total,
    Category,
}

impl BudgetScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetScope::Total => "total",
            BudgetScope::Category => "category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub id: i64,
    pub name: String,
}

/// Monthly budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    /// `YYYY-MM`
    pub month: String,
    pub scope: BudgetScope,
    pub limit_base_amount: Decimal,
    #[serde(default)]
    pub category: Option<BudgetCategory>,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/budgets/`
#[derive(Debug, Clone, Serialize)]
pub struct NewBudget {
    pub month: String,
    pub scope: BudgetScope,
    pub limit_base_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Spending against one budget for the month
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetStatusItem {
    pub budget_id: i64,
    pub title: String,
    pub scope: BudgetScope,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(deserialize_with = "lenient_decimal")]
    pub limit: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub spent: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub remaining: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub percent_used: Decimal,
    #[serde(default)]
    pub alert_80_sent: bool,
    #[serde(default)]
    pub alert_100_sent: bool,
}

impl BudgetStatusItem {
    pub fn is_over(&self) -> bool {
        self.spent > self.limit
    }

    /// At or above the 80% warning line
    pub fn is_near_limit(&self) -> bool {
        self.percent_used >= Decimal::new(80, 0)
    }
}

/// `GET /api/budgets/status/?month=`
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetStatus {
    pub month: String,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub items: Vec<BudgetStatusItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_item_thresholds() {
        let item: BudgetStatusItem = serde_json::from_value(json!({
            "budget_id": 1,
            "title": "Total Budget",
            "scope": "total",
            "category_id": null,
            "limit": "1000.00",
            "spent": "850.00",
            "remaining": "150.00",
            "percent_used": "85.00",
            "alert_80_sent": true,
            "alert_100_sent": false
        }))
        .unwrap();

        assert!(item.is_near_limit());
        assert!(!item.is_over());
        assert_eq!(item.scope, BudgetScope::Total);
    }

    #[test]
    fn test_new_budget_omits_missing_category() {
        let budget = NewBudget {
            month: "2024-02".to_string(),
            scope: BudgetScope::Total,
            limit_base_amount: Decimal::new(500000, 2),
            category_id: None,
        };
        let value = serde_json::to_value(&budget).unwrap();
        assert_eq!(value["scope"], "total");
        assert_eq!(value["limit_base_amount"], "5000.00");
        assert!(value.get("category_id").is_none());
    }
}
