pub mod auth_service;
pub mod insight_service;

pub use auth_service::{AuthService, BootstrapOutcome};
pub use insight_service::InsightService;
