//! Records exchanged with the finance API.
//!
//! All of these are server-owned; the client keeps transient copies for
//! display and never treats them as a source of truth.

pub mod budget;
pub mod category;
pub mod insight;
pub mod pagination;
pub mod report;
pub mod transaction;
pub mod user;
pub mod wallet;

// Re-export all models for convenient access
pub use budget::{Budget, BudgetScope, BudgetStatus, BudgetStatusItem, NewBudget};
pub use category::{Category, CategoryType};
pub use insight::{InsightLanguage, InsightOutcome, InsightSource, MonthlyInsight};
pub use pagination::Paginated;
pub use report::{
    CategoryTotal, MerchantTotal, ReportType, ReportsByCategory, ReportsSummary,
    ReportsTopMerchants, ReportsTrend, ReportsWalletBalances, TrendInterval, TrendPoint,
    WalletBalance,
};
pub use transaction::{
    NewTransaction, ReceiptUpload, Transaction, TransactionPatch, TransactionQuery,
    TransactionType, TransferRequest, TransferResult,
};
pub use user::{Credentials, LoginResponse, Profile, RegisteredUser, Registration, User};
pub use wallet::Wallet;
