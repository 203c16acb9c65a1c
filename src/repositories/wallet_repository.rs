use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Paginated, Wallet};
use crate::transport::ApiRequest;
use std::sync::Arc;

/// Access to `/api/wallets/`
pub struct WalletRepository {
    client: Arc<ApiClient>,
}

impl WalletRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// All wallets, whether the server paginates them or not
    pub async fn list(&self) -> ApiResult<Vec<Wallet>> {
        let data = self.client.execute_value(ApiRequest::get("/api/wallets/")).await?;
        Ok(Paginated::normalize(data)?.results)
    }

    /// Active wallets only
    pub async fn list_active(&self) -> ApiResult<Vec<Wallet>> {
        Ok(self.list().await?.into_iter().filter(Wallet::is_active).collect())
    }
}
