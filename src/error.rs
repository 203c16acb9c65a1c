use thiserror::Error;

/// Coarse classification of a failed call, used to decide how a caller reacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 401 - recoverable once through a token refresh
    AuthDenied,
    /// Other 4xx - validation or client errors, surfaced to the user
    Client,
    /// 5xx, timeouts and network failures
    Server,
}

/// Failure of the access-token refresh call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Refresh endpoint answered with a non-2xx status
    #[error("Refresh rejected with status {0}")]
    Rejected(u16),

    /// Refresh endpoint answered 2xx but without an access token
    #[error("Missing access token from refresh")]
    MissingAccess,

    /// Network failure while refreshing
    #[error("Refresh transport error: {0}")]
    Transport(String),

    /// The refresh task was cancelled or panicked
    #[error("Refresh task aborted: {0}")]
    Aborted(String),
}

/// Client-level error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response from the API
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network or timeout failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token refresh failed
    #[error("Refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors raised before any request is sent
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for client errors
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build an HTTP error from a status and raw body
    pub fn http(status: u16, body: &[u8]) -> Self {
        ApiError::Http {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Classify the error for the caller
    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Http { status: 401, .. } | ApiError::Refresh(_) => ErrorClass::AuthDenied,
            ApiError::Http { status, .. } if (400..500).contains(status) => ErrorClass::Client,
            ApiError::Validation(_) | ApiError::Config(_) => ErrorClass::Client,
            _ => ErrorClass::Server,
        }
    }

    /// Message suitable for showing next to the action that triggered it
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::AuthDenied => "Session expired, please log in again".to_string(),
            ErrorClass::Client => match self {
                ApiError::Http { body, .. } => detail_from_body(body)
                    .unwrap_or_else(|| "Request was rejected".to_string()),
                other => other.to_string(),
            },
            ErrorClass::Server => "Server unavailable, please try again later".to_string(),
        }
    }

    /// `detail` / `error` message from a DRF-style error body
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Http { body, .. } => detail_from_body(body),
            _ => None,
        }
    }
}

fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
