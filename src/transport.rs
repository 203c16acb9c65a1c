//! Wire layer between [`ApiClient`](crate::client::ApiClient) and the API.
//!
//! The client only ever talks to a [`Transport`]; production code uses
//! [`ReqwestTransport`], whose cookie store carries the HTTP-only refresh
//! cookie between calls.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Body of an outbound request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// An outbound API call. Cloneable so it can be re-sent after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
    /// Set once the request has been re-sent after a token refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query pairs
    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn with_json<T: Serialize>(mut self, body: &T) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a single file as multipart form data
    pub fn with_file(mut self, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Multipart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            bytes,
        };
        self
    }

    /// Replace the bearer token carried by the request
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Raw response as seen by the client
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Build a response whose body is the serialized JSON value
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as a JSON value, treating an empty body as `null`
    pub fn value(&self) -> ApiResult<serde_json::Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        self.json()
    }

    /// Convert a non-2xx response into an error
    pub fn error_for_status(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::http(self.status, &self.body))
        }
    }
}

/// Sends a single request and returns whatever the server answered.
///
/// Implementations must not interpret status codes: a 401 is a normal
/// `Ok(ApiResponse)`. `Err` is reserved for failures where no response
/// arrived at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse>;
}

/// [`Transport`] backed by a `reqwest` client with a cookie store
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport from client configuration
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        debug!("{} {}", request.method, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                field,
                file_name,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        assert!(ApiResponse::new(204, "").error_for_status().is_ok());

        let err = ApiResponse::new(401, r#"{"detail":"expired"}"#)
            .error_for_status()
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let response = ApiResponse::new(204, "");
        assert_eq!(response.value().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_url_joining() {
        let transport = ReqwestTransport::new(&ClientConfig::default()).unwrap();
        assert_eq!(
            transport.url("/api/wallets/"),
            "http://localhost:8000/api/wallets/"
        );
        assert_eq!(
            transport.url("api/wallets/"),
            "http://localhost:8000/api/wallets/"
        );
    }
}
