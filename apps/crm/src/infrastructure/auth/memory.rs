// In-process auth provider
// Holds bcrypt hashes and issues HS256 tokens, for tests and local runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::jwt::{create_token, verify_token};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthFailure, AuthProvider, AuthSession};

/// Work factor for locally stored hashes
const LOCAL_HASH_COST: u32 = 4;

#[derive(Debug, Clone)]
struct Account {
    user_id: Uuid,
    password_hash: String,
}

/// Auth provider that keeps accounts in memory
///
/// Emails are matched case-insensitively. A token resolves only while its
/// session is live; signing out revokes it.
pub struct InMemoryAuthProvider {
    secret: String,
    session_ttl: Duration,
    accounts: RwLock<HashMap<String, Account>>,
    live_tokens: RwLock<Vec<String>>,
    unavailable: AtomicBool,
}

impl InMemoryAuthProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session_ttl: Duration::hours(1),
            accounts: RwLock::new(HashMap::new()),
            live_tokens: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Number of sessions not yet signed out
    pub fn live_sessions(&self) -> usize {
        self.live_tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Make every call fail as if the provider were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), AuthFailure> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthFailure::Unavailable("Auth provider unreachable".to_string()));
        }
        Ok(())
    }

    fn account(&self, email: &str) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&email.to_lowercase())
            .cloned()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthFailure> {
        self.ensure_available()?;
        let invalid = || AuthFailure::Rejected("Invalid login credentials".to_string());

        let account = self.account(email).ok_or_else(invalid)?;
        let matches = verify_password(password, &account.password_hash)
            .map_err(AuthFailure::Unavailable)?;
        if !matches {
            return Err(invalid());
        }

        let access_token = create_token(account.user_id, email, &self.secret, self.session_ttl)
            .map_err(AuthFailure::Unavailable)?;
        self.live_tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(access_token.clone());

        Ok(AuthSession {
            user_id: account.user_id,
            access_token,
            expires_at: Some(Utc::now() + self.session_ttl),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, AuthFailure> {
        self.ensure_available()?;
        if password.is_empty() {
            return Err(AuthFailure::Rejected("Password is required".to_string()));
        }
        let password_hash =
            hash_password(password, LOCAL_HASH_COST).map_err(AuthFailure::Unavailable)?;

        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let key = email.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(AuthFailure::Rejected("User already registered".to_string()));
        }

        let user_id = Uuid::new_v4();
        accounts.insert(
            key,
            Account {
                user_id,
                password_hash,
            },
        );
        Ok(user_id)
    }

    async fn resolve(&self, access_token: &str) -> Result<Uuid, AuthFailure> {
        self.ensure_available()?;
        let live = self
            .live_tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|token| token == access_token);
        if !live {
            return Err(AuthFailure::Rejected("Session not found".to_string()));
        }

        verify_token(access_token, &self.secret)
            .map(|claims| claims.sub)
            .map_err(AuthFailure::Rejected)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthFailure> {
        self.ensure_available()?;
        let mut live = self.live_tokens.write().unwrap_or_else(PoisonError::into_inner);
        match live.iter().position(|token| *token == session.access_token) {
            Some(pos) => {
                live.remove(pos);
                Ok(())
            }
            None => Err(AuthFailure::Rejected("Session not found".to_string())),
        }
    }
}
