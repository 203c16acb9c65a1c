use crate::models::User;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Authentication state of the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }
}

/// Shared handle to the session. Cloning shares the same state.
///
/// The only mutations are [`set_auth`](Self::set_auth),
/// [`update_access`](Self::update_access) and [`clear`](Self::clear); token
/// and user always move together.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token together with the user it belongs to
    pub async fn set_auth(&self, access_token: String, user: User) {
        debug!("Session set for user {}", user.id);
        let mut session = self.inner.write().await;
        session.access_token = Some(access_token);
        session.user = Some(user);
    }

    /// Replace the access token, keeping the current user.
    ///
    /// Returns `false` (and stores nothing) when no user is present.
    pub async fn update_access(&self, access_token: String) -> bool {
        let mut session = self.inner.write().await;
        if session.user.is_none() {
            return false;
        }
        session.access_token = Some(access_token);
        true
    }

    /// Drop both token and user
    pub async fn clear(&self) {
        debug!("Session cleared");
        *self.inner.write().await = Session::default();
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.access_token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.read().await.user.clone()
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            profile: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_clear_move_together() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated().await);

        store.set_auth("t1".to_string(), user()).await;
        assert!(store.is_authenticated().await);

        store.clear().await;
        assert_eq!(store.snapshot().await, Session::default());
    }

    #[tokio::test]
    async fn test_update_access_requires_user() {
        let store = SessionStore::new();
        assert!(!store.update_access("orphan".to_string()).await);
        assert_eq!(store.access_token().await, None);

        store.set_auth("t1".to_string(), user()).await;
        assert!(store.update_access("t2".to_string()).await);
        assert_eq!(store.access_token().await.as_deref(), Some("t2"));
        assert_eq!(store.user().await, Some(user()));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        store.set_auth("t1".to_string(), user()).await;
        assert_eq!(other.access_token().await.as_deref(), Some("t1"));
    }
}
