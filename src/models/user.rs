use serde::{Deserialize, Serialize};

/// Per-user preferences returned alongside the account
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub base_currency: Option<String>,
}

/// Authenticated user record returned by login and `/api/auth/me/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    /// Base currency from the profile, if the server sent one
    pub fn base_currency(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.base_currency.as_deref())
    }
}

/// Login payload; the server accepts either an email or a username
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
}

impl Credentials {
    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            username: None,
            password: password.into(),
        }
    }

    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: None,
            username: Some(username.into()),
            password: password.into(),
        }
    }
}

/// `POST /api/auth/login/` response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: User,
}

/// Account registration payload
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register/` response
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}
