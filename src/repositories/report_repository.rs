use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ReportType, ReportsByCategory, ReportsSummary, ReportsTopMerchants, ReportsTrend,
    ReportsWalletBalances, TrendInterval,
};
use crate::period::MonthRange;
use crate::transport::ApiRequest;
use chrono::NaiveDate;
use std::sync::Arc;

/// Access to `/api/reports/*`. Month arguments are `YYYY-MM` and are sent as
/// the month's inclusive `from`/`to` range.
pub struct ReportRepository {
    client: Arc<ApiClient>,
}

impl ReportRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Income, expense and net for the month
    pub async fn summary(&self, month: &str) -> ApiResult<ReportsSummary> {
        let range = MonthRange::parse(month)?;
        self.client
            .execute_json(ApiRequest::get("/api/reports/summary/").with_query(range.query_pairs()))
            .await
    }

    /// Totals per category; only `expense` and `income` are accepted
    pub async fn by_category(&self, month: &str, report_type: ReportType) -> ApiResult<ReportsByCategory> {
        if report_type == ReportType::All {
            return Err(ApiError::Validation(
                "by-category report type must be expense or income".to_string(),
            ));
        }
        let range = MonthRange::parse(month)?;
        self.client
            .execute_json(
                ApiRequest::get("/api/reports/by-category/")
                    .with_query(range.query_pairs())
                    .with_query([("type", report_type.as_str())]),
            )
            .await
    }

    /// Income/expense per time bucket
    pub async fn trend(
        &self,
        month: &str,
        interval: TrendInterval,
        report_type: ReportType,
    ) -> ApiResult<ReportsTrend> {
        let range = MonthRange::parse(month)?;
        self.client
            .execute_json(
                ApiRequest::get("/api/reports/trend/")
                    .with_query(range.query_pairs())
                    .with_query([("interval", interval.as_str()), ("type", report_type.as_str())]),
            )
            .await
    }

    /// Merchants with the largest totals
    pub async fn top_merchants(
        &self,
        month: &str,
        report_type: ReportType,
        limit: u32,
    ) -> ApiResult<ReportsTopMerchants> {
        let range = MonthRange::parse(month)?;
        self.client
            .execute_json(
                ApiRequest::get("/api/reports/top-merchants/")
                    .with_query(range.query_pairs())
                    .with_query([
                        ("type", report_type.as_str().to_string()),
                        ("limit", limit.to_string()),
                    ]),
            )
            .await
    }

    /// Per-wallet balances, optionally as of a given day
    pub async fn wallet_balances(&self, as_of: Option<NaiveDate>) -> ApiResult<ReportsWalletBalances> {
        let mut request = ApiRequest::get("/api/reports/wallet-balances/");
        if let Some(day) = as_of {
            request = request.with_query([("as_of", day.format("%Y-%m-%d").to_string())]);
        }
        self.client.execute_json(request).await
    }
}
