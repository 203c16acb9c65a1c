//! Report payloads. Amounts are parsed leniently: the reports endpoints send
//! decimal strings, and anything non-numeric counts as zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Deserialize a decimal from a string or number, mapping garbage to zero
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    })
}

/// Which side of the ledger a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Expense,
    Income,
    All,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Expense => "expense",
            ReportType::Income => "income",
            ReportType::All => "all",
        }
    }
}

/// Trend bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendInterval {
    Daily,
    Weekly,
    Monthly,
}

impl TrendInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendInterval::Daily => "daily",
            TrendInterval::Weekly => "weekly",
            TrendInterval::Monthly => "monthly",
        }
    }
}

/// `GET /api/reports/summary/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsSummary {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub income: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub expense: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub net: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryTotal {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// `GET /api/reports/by-category/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsByCategory {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub items: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendPoint {
    /// Bucket start, `YYYY-MM-DD` (may carry a time part)
    pub bucket: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub income: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub expense: Decimal,
}

impl TrendPoint {
    /// Date part of the bucket
    pub fn day(&self) -> &str {
        self.bucket.get(..10).unwrap_or(&self.bucket)
    }
}

/// `GET /api/reports/trend/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsTrend {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub interval: Option<TrendInterval>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub items: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantTotal {
    pub merchant: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// `GET /api/reports/top-merchants/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsTopMerchants {
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub items: Vec<MerchantTotal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletBalance {
    pub wallet: crate::models::Wallet,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub balance: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub base_balance: Decimal,
}

/// `GET /api/reports/wallet-balances/`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportsWalletBalances {
    #[serde(default)]
    pub as_of: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_base_balance: Decimal,
    #[serde(default)]
    pub items: Vec<WalletBalance>,
}
