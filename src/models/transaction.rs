//! Transaction records, write payloads and the list filter state

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction kinds as the API names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense,
    Income,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    /// Parse the API string form
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            "transfer_out" => Ok(TransactionType::TransferOut),
            "transfer_in" => Ok(TransactionType::TransferIn),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }

    /// Convert to the API string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::TransferOut => "transfer_out",
            TransactionType::TransferIn => "transfer_in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRef {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

/// Transaction as returned by `/api/transactions/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub r#type: TransactionType,
    pub occurred_at: DateTime<Utc>,
    pub amount: Decimal,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub receipt_abs_url: Option<String>,
    pub base_amount: Decimal,
    pub fx_rate: Decimal,
    #[serde(default)]
    pub wallet: Option<WalletRef>,
    #[serde(default)]
    pub currency: Option<CurrencyRef>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
}

impl Transaction {
    pub fn has_receipt(&self) -> bool {
        self.receipt_url.as_deref().map_or(false, |u| !u.is_empty())
    }
}

/// Payload for `POST /api/transactions/`
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub r#type: TransactionType,
    pub occurred_at: DateTime<Utc>,
    pub amount: Decimal,
    pub wallet_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

/// Partial update for `PATCH /api/transactions/{id}/`.
///
/// `category_id: Some(None)` clears the category. A cleared receipt is sent as
/// an empty string since the server does not accept `null` there.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_receipt_url"
    )]
    pub receipt_url: Option<Option<String>>,
}

fn serialize_receipt_url<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(Some(url)) => serializer.serialize_str(url),
        _ => serializer.serialize_str(""),
    }
}

impl TransactionPatch {
    /// Patch that only sets the receipt URL
    pub fn receipt(url: impl Into<String>) -> Self {
        Self {
            receipt_url: Some(Some(url.into())),
            ..Self::default()
        }
    }
}

/// Payload for `POST /api/transactions/transfer/`
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    pub from_wallet_id: i64,
    pub to_wallet_id: i64,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Both legs of a transfer
#[derive(Debug, Clone, Deserialize)]
pub struct TransferResult {
    pub link_id: serde_json::Value,
    pub out_tx: Transaction,
    pub in_tx: Transaction,
}

/// Uploaded receipt reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptUpload {
    pub id: Option<i64>,
    pub receipt_url: String,
}

impl ReceiptUpload {
    /// URL keys the upload endpoint has been seen to use, in priority order
    const URL_KEYS: [&'static str; 5] = ["file_url", "receipt_url", "image_url", "url", "file"];

    /// Extract the upload reference from whichever URL key the server used
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let receipt_url = Self::URL_KEYS
            .iter()
            .filter_map(|key| value.get(*key))
            .find_map(|v| v.as_str())?
            .to_string();

        Some(Self {
            id: value.get("id").and_then(|v| v.as_i64()),
            receipt_url,
        })
    }
}

/// Default page size of the list view
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filter and pagination state of the transaction list.
///
/// The query string is the single source of truth: the state is parsed from
/// it and written back to it, never kept anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: u32,
    pub page_size: u32,
    pub tx_type: Option<TransactionType>,
    pub wallet: Option<i64>,
    pub category: Option<i64>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            tx_type: None,
            wallet: None,
            category: None,
        }
    }
}

impl TransactionQuery {
    /// Parse filter state from a query string (with or without leading `?`).
    /// Unknown keys and unparsable values are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut url = match Url::parse("http://localhost/") {
            Ok(url) => url,
            Err(_) => return Self::default(),
        };
        url.set_query(Some(query.trim_start_matches('?')));
        Self::from_url(&url)
    }

    /// Parse filter state from the query part of a URL
    pub fn from_url(url: &Url) -> Self {
        let mut q = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "from" => q.from = NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok(),
                "to" => q.to = NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok(),
                "page" => q.page = value.parse().ok().filter(|p| *p > 0).unwrap_or(1),
                "page_size" => {
                    q.page_size = value
                        .parse()
                        .ok()
                        .filter(|s| *s > 0)
                        .unwrap_or(DEFAULT_PAGE_SIZE)
                }
                "type" => q.tx_type = TransactionType::from_str(&value).ok(),
                "wallet" => q.wallet = value.parse().ok(),
                "category" => q.category = value.parse().ok(),
                _ => {}
            }
        }
        q
    }

    /// Query pairs for the URL: every field that is set, so a half-filled
    /// date range survives a round trip through the address.
    pub fn to_url_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("from".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        pairs.extend(self.filter_pairs());
        pairs
    }

    /// Query pairs sent to the API. The date range is only sent when both
    /// ends are set, since the server ignores a half-open range.
    pub fn to_api_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let (Some(from), Some(to)) = (self.from, self.to) {
            pairs.push(("from".to_string(), from.format("%Y-%m-%d").to_string()));
            pairs.push(("to".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        pairs.extend(self.filter_pairs());
        pairs
    }

    fn filter_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(t) = self.tx_type {
            pairs.push(("type".to_string(), t.as_str().to_string()));
        }
        if let Some(w) = self.wallet {
            pairs.push(("wallet".to_string(), w.to_string()));
        }
        if let Some(c) = self.category {
            pairs.push(("category".to_string(), c.to_string()));
        }
        if self.page > 1 {
            pairs.push(("page".to_string(), self.page.to_string()));
        }
        if self.page_size != DEFAULT_PAGE_SIZE {
            pairs.push(("page_size".to_string(), self.page_size.to_string()));
        }
        pairs
    }

    /// Render back to a query string (no leading `?`)
    pub fn to_query(&self) -> String {
        let mut url = match Url::parse("http://localhost/") {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        url.query_pairs_mut().extend_pairs(self.to_url_pairs());
        url.query().unwrap_or_default().to_string()
    }

    /// Write the state into a URL, replacing its query
    pub fn apply_to(&self, url: &mut Url) {
        url.set_query(None);
        let pairs = self.to_url_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
    }

    // Filter changes return to the first page; page navigation does not.

    pub fn with_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self.page = 1;
        self
    }

    pub fn with_type(mut self, tx_type: Option<TransactionType>) -> Self {
        self.tx_type = tx_type;
        self.page = 1;
        self
    }

    pub fn with_wallet(mut self, wallet: Option<i64>) -> Self {
        self.wallet = wallet;
        self.page = 1;
        self
    }

    pub fn with_category(mut self, category: Option<i64>) -> Self {
        self.category = category;
        self.page = 1;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self.page = 1;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Number of pages for a result set of `count` items
    pub fn total_pages(&self, count: u64) -> u64 {
        let size = u64::from(self.page_size.max(1));
        count.div_ceil(size).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_query_is_empty() {
        assert!(TransactionQuery::default().to_api_pairs().is_empty());
        assert!(TransactionQuery::default().to_url_pairs().is_empty());
        assert_eq!(TransactionQuery::default().to_query(), "");
    }

    #[test]
    fn test_from_query_reads_filters() {
        let q = TransactionQuery::from_query("?type=expense&wallet=3&page=2&from=2024-02-01&to=2024-02-29&junk=1");
        assert_eq!(q.tx_type, Some(TransactionType::Expense));
        assert_eq!(q.wallet, Some(3));
        assert_eq!(q.page, 2);
        assert_eq!(q.from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(q.to, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(q.category, None);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let q = TransactionQuery::from_query("page=0&page_size=abc&type=refund&wallet=x");
        assert_eq!(q, TransactionQuery::default());
    }

    #[test]
    fn test_filter_change_resets_page() {
        let q = TransactionQuery::default().with_page(4).with_type(Some(TransactionType::Income));
        assert_eq!(q.page, 1);

        let q = q.with_page(3);
        assert_eq!(q.page, 3);
        assert_eq!(q.tx_type, Some(TransactionType::Income));
    }

    #[test]
    fn test_half_open_range_not_sent() {
        let q = TransactionQuery::default().with_range(NaiveDate::from_ymd_opt(2024, 1, 1), None);
        assert!(q.to_api_pairs().iter().all(|(k, _)| k != "from"));
    }

    #[test]
    fn test_half_open_range_survives_url_round_trip() {
        let q = TransactionQuery::default()
            .with_range(NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .with_type(Some(TransactionType::Expense));
        let mut url = Url::parse("http://localhost/transactions").unwrap();
        q.apply_to(&mut url);

        assert_eq!(url.query(), Some("from=2024-01-01&type=expense"));
        assert_eq!(TransactionQuery::from_url(&url), q);
        assert_eq!(TransactionQuery::from_query(&q.to_query()), q);

        let q = TransactionQuery::default().with_range(None, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(TransactionQuery::from_query(&q.to_query()), q);
    }

    #[test]
    fn test_apply_to_url_replaces_query() {
        let mut url = Url::parse("http://localhost/transactions?stale=1").unwrap();
        let q = TransactionQuery::default().with_category(Some(9)).with_page(2);
        q.apply_to(&mut url);
        assert_eq!(url.query(), Some("category=9&page=2"));
        assert_eq!(TransactionQuery::from_url(&url), q);
    }

    #[test]
    fn test_total_pages() {
        let q = TransactionQuery::default();
        assert_eq!(q.total_pages(0), 1);
        assert_eq!(q.total_pages(20), 1);
        assert_eq!(q.total_pages(21), 2);
    }

    #[test]
    fn test_total_pages_does_not_overflow() {
        let q = TransactionQuery::default();
        assert_eq!(q.total_pages(u64::MAX), u64::MAX / 20 + 1);
        assert_eq!(q.with_page_size(1).total_pages(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_patch_serializes_cleared_receipt_as_empty_string() {
        let patch = TransactionPatch {
            receipt_url: Some(None),
            ..TransactionPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "receipt_url": "" }));

        let patch = TransactionPatch {
            category_id: Some(None),
            ..TransactionPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "category_id": null }));
    }

    #[test]
    fn test_receipt_upload_tolerates_variant_keys() {
        let upload = ReceiptUpload::from_value(&json!({ "id": 5, "image_url": "/media/r.png" })).unwrap();
        assert_eq!(upload.id, Some(5));
        assert_eq!(upload.receipt_url, "/media/r.png");

        let upload = ReceiptUpload::from_value(&json!({ "file": "/media/a.jpg", "url": "/media/b.jpg" })).unwrap();
        assert_eq!(upload.receipt_url, "/media/b.jpg");

        assert!(ReceiptUpload::from_value(&json!({ "id": 1 })).is_none());
    }

    #[test]
    fn test_transaction_deserializes_string_amounts() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 1,
            "type": "expense",
            "occurred_at": "2024-02-10T08:30:00Z",
            "amount": "120.50",
            "merchant": "Cafe",
            "note": "",
            "receipt_url": null,
            "base_amount": "120.50",
            "fx_rate": "1.000000",
            "wallet": { "id": 2, "name": "Cash" },
            "currency": { "code": "THB" },
            "category": null
        }))
        .unwrap();

        assert_eq!(tx.amount, Decimal::new(12050, 2));
        assert_eq!(tx.r#type, TransactionType::Expense);
        assert!(!tx.has_receipt());
    }
}
