//! Monthly insight: the AI summary when the server can produce one, otherwise
//! a rule-based summary built from the reports endpoints.

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    InsightLanguage, InsightOutcome, InsightSource, MonthlyInsight, ReportType, ReportsByCategory,
    ReportsSummary, ReportsTrend, TrendInterval, TrendPoint,
};
use crate::period::MonthRange;
use crate::repositories::ReportRepository;
use crate::transport::ApiRequest;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Currency used when neither the AI answer nor the reports name one
pub const DEFAULT_CURRENCY: &str = "THB";

/// Number of expense categories listed in the fallback summary
pub const TOP_CATEGORIES: usize = 3;

pub struct InsightService {
    client: Arc<ApiClient>,
    reports: ReportRepository,
}

impl InsightService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            reports: ReportRepository::new(client.clone()),
            client,
        }
    }

    /// Produce the summary for `month` (`YYYY-MM`).
    ///
    /// Any failure of the AI endpoint selects the fallback. Only a failure to
    /// load the reports the fallback is built from is returned as an error.
    pub async fn monthly_insight(
        &self,
        month: &str,
        language: InsightLanguage,
    ) -> ApiResult<InsightOutcome> {
        MonthRange::parse(month)?;

        match self.remote_insight(month, language).await {
            Ok(insight) => {
                info!("AI summary generated for {}", month);
                Ok(InsightOutcome::Remote(insight))
            }
            Err(e) => {
                if is_provider_auth_error(&e) {
                    warn!("AI provider rejected credentials, using report fallback: {}", e);
                } else {
                    warn!("AI summary unavailable, using report fallback: {}", e);
                }
                let insight = self.fallback_insight(month, language).await?;
                Ok(InsightOutcome::Fallback {
                    insight,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Ask the server's AI endpoint for a summary
    pub async fn remote_insight(
        &self,
        month: &str,
        language: InsightLanguage,
    ) -> ApiResult<MonthlyInsight> {
        let data = self
            .client
            .execute_value(
                ApiRequest::post("/api/ai/monthly-summary/")
                    .with_json(&json!({ "month": month, "language": language }))?,
            )
            .await?;
        Ok(insight_from_ai_response(&data, month, language))
    }

    /// Build the rule-based summary from the month's reports
    pub async fn fallback_insight(
        &self,
        month: &str,
        language: InsightLanguage,
    ) -> ApiResult<MonthlyInsight> {
        let (summary, by_category, trend) = tokio::try_join!(
            self.reports.summary(month),
            self.reports.by_category(month, ReportType::Expense),
            self.reports.trend(month, TrendInterval::Daily, ReportType::All),
        )?;
        build_fallback_insight(month, language, &summary, &by_category, &trend)
    }
}

/// Errors the server relays when the AI provider key is missing or invalid
fn is_provider_auth_error(error: &ApiError) -> bool {
    if error.is_unauthorized() {
        return true;
    }
    let message = error.detail().unwrap_or_else(|| error.to_string()).to_lowercase();
    message.contains("invalid_api_key")
        || message.contains("incorrect api key")
        || message.contains("authentication")
}

/// Map the AI endpoint's answer; the text may arrive under several keys
fn insight_from_ai_response(data: &Value, month: &str, language: InsightLanguage) -> MonthlyInsight {
    let text_field = |keys: &[&str]| {
        keys.iter()
            .filter_map(|key| data.get(*key))
            .find_map(Value::as_str)
            .map(str::to_string)
    };

    MonthlyInsight {
        month: text_field(&["month"]).unwrap_or_else(|| month.to_string()),
        language: text_field(&["language"])
            .and_then(|l| InsightLanguage::from_str(&l).ok())
            .unwrap_or(language),
        base_currency: text_field(&["base_currency", "currency"])
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        text: text_field(&["text", "insight", "summary"]).unwrap_or_default(),
        source: InsightSource::Ai,
    }
}

/// Fixed sentences of the fallback summary in one language
struct FallbackCopy {
    title: &'static str,
    range: &'static str,
    income: &'static str,
    expense: &'static str,
    net: &'static str,
    top_header: &'static str,
    peak_day: &'static str,
    over_budget: &'static str,
    no_expense: &'static str,
    healthy: &'static str,
}

const THAI: FallbackCopy = FallbackCopy {
    title: "สรุปการเงินประจำเดือน",
    range: "ช่วงเวลา",
    income: "• รายรับ (Income)",
    expense: "• รายจ่าย (Expense)",
    net: "• คงเหลือสุทธิ (Net)",
    top_header: "Top หมวดรายจ่าย:",
    peak_day: "วันที่ใช้จ่ายสูงสุด",
    over_budget: "ข้อสังเกต: รายจ่ายมากกว่ารายรับ ลองตั้งงบ (Budgets) และลดหมวด Top 1 ลงเล็กน้อยครับ",
    no_expense: "ข้อสังเกต: เดือนนี้ยังไม่มีรายจ่าย ลองเพิ่ม Transaction เพื่อให้เห็นรายงานชัดขึ้นครับ",
    healthy: "ข้อสังเกต: ภาพรวมดูโอเค ลองติดตาม Trend รายวันและปรับ Budgets ให้เหมาะสมครับ",
};

const ENGLISH: FallbackCopy = FallbackCopy {
    title: "Monthly Finance Summary -",
    range: "Range",
    income: "• Income",
    expense: "• Expense",
    net: "• Net",
    top_header: "Top expense categories:",
    peak_day: "Highest spending day",
    over_budget: "Insight: Expenses exceed income. Consider setting budgets and cutting the top category slightly.",
    no_expense: "Insight: No expenses this month. Add transactions to get meaningful analytics.",
    healthy: "Insight: Looks healthy. Keep tracking the daily trend and refine budgets.",
};

fn copy_for(language: InsightLanguage) -> &'static FallbackCopy {
    match language {
        InsightLanguage::Th => &THAI,
        InsightLanguage::En => &ENGLISH,
    }
}

fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", amount.round_dp(2), currency)
}

/// Expense categories by total, largest first, at most [`TOP_CATEGORIES`]
pub fn top_categories(by_category: &ReportsByCategory) -> Vec<(String, Decimal)> {
    let mut items: Vec<(String, Decimal)> = by_category
        .items
        .iter()
        .map(|item| {
            let name = item
                .category_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or("Uncategorized")
                .to_string();
            (name, item.total)
        })
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    items.truncate(TOP_CATEGORIES);
    items
}

/// First day with the highest expense
pub fn peak_expense_day(trend: &ReportsTrend) -> Option<&TrendPoint> {
    trend.items.iter().fold(None, |best: Option<&TrendPoint>, point| match best {
        Some(b) if b.expense >= point.expense => Some(b),
        _ => Some(point),
    })
}

/// Render the rule-based summary from already loaded reports
pub fn build_fallback_insight(
    month: &str,
    language: InsightLanguage,
    summary: &ReportsSummary,
    by_category: &ReportsByCategory,
    trend: &ReportsTrend,
) -> ApiResult<MonthlyInsight> {
    let range = MonthRange::parse(month)?;
    let copy = copy_for(language);

    let currency = [&summary.base_currency, &by_category.base_currency, &trend.base_currency]
        .into_iter()
        .filter_map(|c| c.as_deref())
        .find(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    let from = summary
        .from
        .clone()
        .unwrap_or_else(|| range.from.format("%Y-%m-%d").to_string());
    let to = summary
        .to
        .clone()
        .unwrap_or_else(|| range.to.format("%Y-%m-%d").to_string());

    let income = summary.income;
    let expense = summary.expense;

    let mut lines = vec![
        format!("{} {}", copy.title, month),
        format!("{}: {} → {}", copy.range, from, to),
        String::new(),
        format!("{}: {}", copy.income, money(income, &currency)),
        format!("{}: {}", copy.expense, money(expense, &currency)),
        format!("{}: {}", copy.net, money(summary.net, &currency)),
        String::new(),
    ];

    let top = top_categories(by_category);
    if !top.is_empty() {
        lines.push(copy.top_header.to_string());
        for (i, (name, total)) in top.iter().enumerate() {
            lines.push(format!("  {}) {}: {}", i + 1, name, money(*total, &currency)));
        }
        lines.push(String::new());
    }

    if let Some(peak) = peak_expense_day(trend).filter(|p| p.expense > Decimal::ZERO) {
        lines.push(format!(
            "{}: {} ({})",
            copy.peak_day,
            peak.day(),
            money(peak.expense, &currency)
        ));
        lines.push(String::new());
    }

    let comment = if expense > income && income > Decimal::ZERO {
        copy.over_budget
    } else if expense.is_zero() {
        copy.no_expense
    } else {
        copy.healthy
    };
    lines.push(comment.to_string());

    Ok(MonthlyInsight {
        month: month.to_string(),
        language,
        base_currency: currency,
        text: lines.join("\n"),
        source: InsightSource::Fallback,
    })
}
