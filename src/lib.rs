//! Finance client library
//!
//! Authenticated access to the personal finance tracker API: a client that
//! refreshes expired access tokens once per request (sharing a single refresh
//! between concurrent callers), typed repositories for each REST collection,
//! and monthly insights with a report-based fallback.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod period;
pub mod repositories;
pub mod services;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorClass, RefreshError};
pub use session::{Session, SessionStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

use repositories::*;
use services::{AuthService, InsightService};
use std::sync::Arc;

/// Application state: the shared client plus every repository and service
pub struct AppState {
    pub client: Arc<ApiClient>,
    pub auth: AuthService,
    pub transactions: TransactionRepository,
    pub budgets: BudgetRepository,
    pub reports: ReportRepository,
    pub wallets: WalletRepository,
    pub categories: CategoryRepository,
    pub insights: InsightService,
}

impl AppState {
    /// Wire repositories and services around one client
    pub fn new(client: ApiClient) -> Self {
        let client = Arc::new(client);

        Self {
            auth: AuthService::new(client.clone()),
            transactions: TransactionRepository::new(client.clone()),
            budgets: BudgetRepository::new(client.clone()),
            reports: ReportRepository::new(client.clone()),
            wallets: WalletRepository::new(client.clone()),
            categories: CategoryRepository::new(client.clone()),
            insights: InsightService::new(client.clone()),
            client,
        }
    }

    /// Build the state from configuration, using the HTTP transport
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }
}
