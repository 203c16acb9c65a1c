use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Credentials, LoginResponse, RegisteredUser, Registration, User};
use crate::transport::ApiRequest;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Result of the startup authentication check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Silent refresh worked and the user record is loaded
    Authenticated(User),
    /// No usable refresh cookie; the caller should send the user to log in
    LoginRequired,
}

impl BootstrapOutcome {
    pub fn user(&self) -> Option<&User> {
        match self {
            BootstrapOutcome::Authenticated(user) => Some(user),
            BootstrapOutcome::LoginRequired => None,
        }
    }
}

/// Login, logout, registration and the startup session check
pub struct AuthService {
    client: Arc<ApiClient>,
    bootstrap: OnceCell<BootstrapOutcome>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            bootstrap: OnceCell::new(),
        }
    }

    /// Log in with email or username and store the session
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        if credentials.password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }
        if credentials.email.is_none() && credentials.username.is_none() {
            return Err(ApiError::Validation("Email or username is required".to_string()));
        }

        // Bad credentials answer 401; that must not trigger a refresh.
        let login: LoginResponse = self
            .client
            .send_raw(ApiRequest::post("/api/auth/login/").with_json(credentials)?)
            .await?
            .error_for_status()?
            .json()?;

        info!("Logged in as {}", login.user.username);
        self.client
            .session()
            .set_auth(login.access, login.user.clone())
            .await;
        Ok(login.user)
    }

    /// Current user record
    pub async fn me(&self) -> ApiResult<User> {
        self.client.execute_json(ApiRequest::get("/api/auth/me/")).await
    }

    /// Log out server side; the local session is cleared even if that fails
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.client.execute(ApiRequest::post("/api/auth/logout/")).await;
        self.client.session().clear().await;
        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!("Logout request failed, session cleared anyway: {}", e);
                Err(e)
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> ApiResult<RegisteredUser> {
        self.client
            .send_raw(ApiRequest::post("/api/auth/register/").with_json(registration)?)
            .await?
            .error_for_status()?
            .json()
    }

    /// Startup check: silent refresh, then load the user.
    ///
    /// Runs at most once per service; later calls return the first outcome.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        self.bootstrap
            .get_or_init(|| self.run_bootstrap())
            .await
            .clone()
    }

    async fn run_bootstrap(&self) -> BootstrapOutcome {
        match self.restore_session().await {
            Ok(user) => {
                info!("Session restored for {}", user.username);
                BootstrapOutcome::Authenticated(user)
            }
            Err(e) => {
                warn!("Not authenticated: {}", e);
                self.client.session().clear().await;
                BootstrapOutcome::LoginRequired
            }
        }
    }

    async fn restore_session(&self) -> ApiResult<User> {
        let access = self.client.refresh().await?;
        let user: User = self
            .client
            .execute_json(ApiRequest::get("/api/auth/me/").with_bearer(Some(access.clone())))
            .await?;
        self.client.session().set_auth(access, user.clone()).await;
        Ok(user)
    }
}
