use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewTransaction, Paginated, ReceiptUpload, Transaction, TransactionPatch, TransactionQuery,
    TransferRequest, TransferResult,
};
use crate::transport::ApiRequest;
use std::sync::Arc;
use tracing::info;

/// Access to `/api/transactions/` and receipt uploads
pub struct TransactionRepository {
    client: Arc<ApiClient>,
}

impl TransactionRepository {
    /// Create a new TransactionRepository
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List one page of transactions matching the filter
    pub async fn list(&self, query: &TransactionQuery) -> ApiResult<Paginated<Transaction>> {
        let data = self
            .client
            .execute_value(ApiRequest::get("/api/transactions/").with_query(query.to_api_pairs()))
            .await?;
        Paginated::normalize(data)
    }

    /// Fetch a single transaction
    pub async fn get(&self, id: i64) -> ApiResult<Transaction> {
        self.client
            .execute_json(ApiRequest::get(format!("/api/transactions/{}/", id)))
            .await
    }

    /// Record a new income or expense
    pub async fn create(&self, payload: &NewTransaction) -> ApiResult<Transaction> {
        let tx: Transaction = self
            .client
            .execute_json(ApiRequest::post("/api/transactions/").with_json(payload)?)
            .await?;
        info!("Created transaction {}", tx.id);
        Ok(tx)
    }

    /// Partially update a transaction
    pub async fn patch(&self, id: i64, patch: &TransactionPatch) -> ApiResult<Transaction> {
        self.client
            .execute_json(ApiRequest::patch(format!("/api/transactions/{}/", id)).with_json(patch)?)
            .await
    }

    /// Delete a transaction (soft-deleted server side)
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .execute(ApiRequest::delete(format!("/api/transactions/{}/", id)))
            .await?;
        info!("Deleted transaction {}", id);
        Ok(())
    }

    /// Move money between two wallets; returns both legs
    pub async fn transfer(&self, request: &TransferRequest) -> ApiResult<TransferResult> {
        if request.from_wallet_id == request.to_wallet_id {
            return Err(ApiError::Validation(
                "Transfer source and destination must differ".to_string(),
            ));
        }
        self.client
            .execute_json(ApiRequest::post("/api/transactions/transfer/").with_json(request)?)
            .await
    }

    /// Upload a receipt image
    pub async fn upload_receipt(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<ReceiptUpload> {
        let data = self
            .client
            .execute_value(ApiRequest::post("/api/receipts/upload/").with_file("file", file_name, bytes))
            .await?;
        ReceiptUpload::from_value(&data).ok_or_else(|| {
            ApiError::Validation("Receipt upload response carried no file URL".to_string())
        })
    }

    /// Upload a receipt and attach it to a transaction
    pub async fn attach_receipt(&self, id: i64, file_name: &str, bytes: Vec<u8>) -> ApiResult<Transaction> {
        let upload = self.upload_receipt(file_name, bytes).await?;
        self.patch(id, &TransactionPatch::receipt(upload.receipt_url)).await
    }
}
