//! Authenticated HTTP client.
//!
//! Every request goes out with the session's bearer token. A 401 on a request
//! that has not been retried yet triggers a token refresh; concurrent 401s
//! join the refresh already in flight instead of starting their own, and each
//! request is re-sent at most once.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, RefreshError};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Refresh endpoint; authenticated by the HTTP-only refresh cookie
pub const REFRESH_PATH: &str = "/api/auth/refresh/";

type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

/// API client holding the transport, the session and the in-flight refresh
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    /// At most one pending refresh; cleared by the refresh task when it settles
    refreshing: Arc<Mutex<Option<SharedRefresh>>>,
}

impl ApiClient {
    /// Create a client over an existing transport and session
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            transport,
            session,
            refreshing: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a client talking to the configured API over HTTP
    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), SessionStore::new()))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Whether a token refresh is currently pending
    pub async fn is_refreshing(&self) -> bool {
        self.refreshing.lock().await.is_some()
    }

    /// Send a request, recovering once from an expired access token.
    ///
    /// A bearer already set on the request takes precedence over the session
    /// token. Failures other than a first 401 are returned unchanged; if the
    /// refresh itself fails the session is cleared and the original 401 is
    /// returned.
    pub async fn execute(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        if request.bearer.is_none() {
            request.bearer = self.session.access_token().await;
        }

        loop {
            let response = self.transport.send(request.clone()).await?;
            if response.is_success() {
                return Ok(response);
            }

            let error = ApiError::http(response.status, &response.body);
            if response.status != 401 || request.retried {
                return Err(error);
            }

            request.retried = true;
            match self.refresh().await {
                Ok(access) => {
                    debug!("Retrying {} {} with refreshed token", request.method, request.path);
                    request.bearer = Some(access);
                }
                Err(e) => {
                    warn!("Not retrying {} {}: {}", request.method, request.path, e);
                    return Err(error);
                }
            }
        }
    }

    /// Send a request without token attachment or 401 recovery
    pub async fn send_raw(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.transport.send(request).await
    }

    /// Execute and decode the JSON body
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        self.execute(request).await?.json()
    }

    /// Execute and return the body as a JSON value (`null` when empty)
    pub async fn execute_value(&self, request: ApiRequest) -> ApiResult<serde_json::Value> {
        self.execute(request).await?.value()
    }

    /// Obtain a fresh access token, joining the refresh in flight if there is one.
    ///
    /// On success the session token is updated (when a user is present); on
    /// failure the session is cleared. Both happen once per refresh, not once
    /// per caller.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let pending = {
            let mut slot = self.refreshing.lock().await;
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    info!("Starting token refresh");
                    let pending = self.spawn_refresh();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn spawn_refresh(&self) -> SharedRefresh {
        let transport = self.transport.clone();
        let session = self.session.clone();
        let slot = self.refreshing.clone();

        let task = tokio::spawn(async move {
            let result = request_refresh(transport.as_ref()).await;
            match &result {
                Ok(access) => {
                    if !session.update_access(access.clone()).await {
                        debug!("Refreshed token not stored: no user in session");
                    }
                    info!("Token refresh succeeded");
                }
                Err(e) => {
                    warn!("Token refresh failed: {}", e);
                    session.clear().await;
                }
            }
            slot.lock().await.take();
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(RefreshError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }
}

/// Call the refresh endpoint directly on the transport. A 401 here is a
/// refresh failure, never another refresh.
async fn request_refresh(transport: &dyn Transport) -> Result<String, RefreshError> {
    let response = transport
        .send(ApiRequest::post(REFRESH_PATH))
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    if !response.is_success() {
        return Err(RefreshError::Rejected(response.status));
    }

    let body: RefreshResponse = response.json().map_err(|_| RefreshError::MissingAccess)?;
    body.access
        .filter(|access| !access.is_empty())
        .ok_or(RefreshError::MissingAccess)
}
