use std::env;
use std::time::Duration;

/// Credentials used by the CLI to log in non-interactively
#[derive(Debug, Clone, Default)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub log_level: String,
    pub environment: String,
    pub credentials: CredentialsConfig,
}

impl CredentialsConfig {
    /// Read optional credentials from environment variables
    pub fn from_env() -> Self {
        Self {
            email: env::var("FINANCE_API_EMAIL").ok().filter(|s| !s.is_empty()),
            username: env::var("FINANCE_API_USERNAME").ok().filter(|s| !s.is_empty()),
            password: env::var("FINANCE_API_PASSWORD").ok().filter(|s| !s.is_empty()),
        }
    }

    /// A password plus at least one identifier
    pub fn is_complete(&self) -> bool {
        self.password.is_some() && (self.email.is_some() || self.username.is_some())
    }
}

impl ClientConfig {
    /// Create client config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("FINANCE_API_BASE_URL")
            .map_err(|_| "FINANCE_API_BASE_URL environment variable is required")?;

        let timeout_secs = env::var("FINANCE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self {
            base_url,
            timeout_secs,
            log_level,
            environment,
            credentials: CredentialsConfig::from_env(),
        }
        .validated()
    }

    /// Normalise and validate a configuration
    pub fn validated(mut self) -> Result<Self, String> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(format!(
                "Invalid FINANCE_API_BASE_URL: {}. Must start with http:// or https://",
                self.base_url
            ));
        }

        if self.timeout_secs == 0 {
            return Err("FINANCE_API_TIMEOUT_SECS must be greater than 0".to_string());
        }

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                self.environment, valid_environments
            ));
        }

        self.base_url = base_url;
        self.log_level = self.log_level.to_lowercase();
        self.environment = self.environment.to_lowercase();
        Ok(self)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            credentials: CredentialsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_validated_trims_trailing_slash() {
        let config = ClientConfig {
            base_url: "https://api.example.com/".to_string(),
            log_level: "DEBUG".to_string(),
            ..ClientConfig::default()
        }
        .validated()
        .unwrap();

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validated_rejects_bad_values() {
        let bad_url = ClientConfig {
            base_url: "api.example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(bad_url.validated().is_err());

        let zero_timeout = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(zero_timeout.validated().is_err());

        let bad_env = ClientConfig {
            environment: "qa".to_string(),
            ..ClientConfig::default()
        };
        assert!(bad_env.validated().is_err());
    }

    #[test]
    fn test_credentials_completeness() {
        let mut creds = CredentialsConfig::default();
        assert!(!creds.is_complete());
        creds.password = Some("secret".to_string());
        assert!(!creds.is_complete());
        creds.username = Some("alice".to_string());
        assert!(creds.is_complete());
    }
}
