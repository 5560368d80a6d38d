use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by an auth provider
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The provider answered and refused the request
    #[error("Rejected by auth provider: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),
}

/// A signed-in session issued by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Identity of the signed-in user, shared with the `profiles` collection
    pub user_id: Uuid,
    /// Bearer token for subsequent calls
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// External authentication provider
///
/// Accepts email/password credentials and hands back identities. Passwords
/// never leave the provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthFailure>;

    /// Register new credentials, returning the issued identity
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, AuthFailure>;

    /// Resolve an existing access token to its identity
    async fn resolve(&self, access_token: &str) -> Result<Uuid, AuthFailure>;

    /// End a session
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthFailure>;
}
