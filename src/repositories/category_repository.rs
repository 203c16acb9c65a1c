use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Category, CategoryType, Paginated};
use crate::transport::ApiRequest;
use std::sync::Arc;

/// Access to `/api/categories/`
pub struct CategoryRepository {
    client: Arc<ApiClient>,
}

impl CategoryRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Categories, optionally restricted to one type
    pub async fn list(&self, category_type: Option<CategoryType>) -> ApiResult<Vec<Category>> {
        let mut request = ApiRequest::get("/api/categories/");
        if let Some(t) = category_type {
            request = request.with_query([("type", t.as_str())]);
        }
        let data = self.client.execute_value(request).await?;
        Ok(Paginated::normalize(data)?.results)
    }
}
