use std::sync::Arc;

use crate::app::errors::CrmError;
use crate::auth::{AuthProvider, AuthSession};
use crate::domain::repositories::ProfileRepository;
use crate::domain::{Profile, Username};

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Startup, before any stored session has been looked at
    Checking,
    Authenticated(Profile),
    Anonymous,
}

/// Resolves who is acting and whether they may act
///
/// Credentials go to the auth provider; role and activation come from the
/// `profiles` collection. An inactive or missing profile never reaches the
/// `Authenticated` state.
pub struct SessionGate {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileRepository>,
    login_domain: String,
    state: AuthState,
    session: Option<AuthSession>,
}

impl SessionGate {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileRepository>,
        login_domain: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            profiles,
            login_domain: login_domain.into(),
            state: AuthState::Checking,
            session: None,
        }
    }

    /// Signs in with username and password
    ///
    /// # Returns
    /// * `Ok(Profile)` - The active profile of the signed-in user
    /// * `Err(CrmError::Validation)` - Blank username or password
    /// * `Err(CrmError::Unauthorized)` - Credentials rejected by the provider
    /// * `Err(CrmError::ProfileMissing)` / `Err(CrmError::AccountInactive)` -
    ///   Provider accepted the credentials but the profile may not sign in;
    ///   the provider session is ended again
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<Profile, CrmError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CrmError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let username = Username::new(username).map_err(CrmError::Validation)?;
        let email = username.login_email(&self.login_domain);

        self.state = AuthState::Anonymous;
        self.session = None;

        let session = self.auth.sign_in(&email, password).await.map_err(|failure| {
            tracing::info!(username = %username, "Sign-in failed: {}", failure);
            CrmError::from(failure)
        })?;

        match self.admit(session.user_id).await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, role = %profile.role, "Signed in");
                self.session = Some(session);
                self.state = AuthState::Authenticated(profile.clone());
                Ok(profile)
            }
            Err(err) => {
                self.end_provider_session(&session).await;
                Err(err)
            }
        }
    }

    /// Resumes a stored provider session at startup
    ///
    /// Any failure, including a missing, inactive or unresolvable identity,
    /// leaves the gate `Anonymous`.
    pub async fn restore(&mut self, access_token: Option<&str>) -> &AuthState {
        self.state = AuthState::Anonymous;
        self.session = None;

        let Some(token) = access_token else {
            return &self.state;
        };

        let user_id = match self.auth.resolve(token).await {
            Ok(user_id) => user_id,
            Err(failure) => {
                tracing::info!("Stored session not restored: {}", failure);
                return &self.state;
            }
        };

        let session = AuthSession {
            user_id,
            access_token: token.to_string(),
            expires_at: None,
        };
        match self.admit(user_id).await {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, "Session restored");
                self.session = Some(session);
                self.state = AuthState::Authenticated(profile);
            }
            Err(err) => {
                tracing::info!(user_id = %user_id, "Stored session not restored: {}", err);
                if matches!(err, CrmError::AccountInactive | CrmError::ProfileMissing) {
                    self.end_provider_session(&session).await;
                }
            }
        }
        &self.state
    }

    /// Drops the identity; the provider sign-out is best effort
    pub async fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            self.end_provider_session(&session).await;
            tracing::info!(user_id = %session.user_id, "Signed out");
        }
        self.state = AuthState::Anonymous;
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Returns the signed-in profile, if any
    pub fn current(&self) -> Option<&Profile> {
        match &self.state {
            AuthState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    /// Returns the bearer token of the live provider session
    pub fn access_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.access_token.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.current().is_some_and(Profile::is_admin)
    }

    /// Returns the acting profile or `Unauthorized`
    pub fn require_actor(&self) -> Result<&Profile, CrmError> {
        self.current().ok_or(CrmError::Unauthorized)
    }

    /// Returns the acting profile if it holds the admin role
    pub fn require_admin(&self) -> Result<&Profile, CrmError> {
        let actor = self.require_actor()?;
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(CrmError::forbidden("Admin role required"))
        }
    }

    /// Replaces the cached actor profile after a reload
    ///
    /// Keeps role and username changes made by an admin to their own account
    /// in effect without signing in again.
    pub(crate) fn refresh_actor(&mut self, latest: &Profile) {
        if let AuthState::Authenticated(current) = &mut self.state {
            if current.id == latest.id {
                *current = latest.clone();
            }
        }
    }

    async fn admit(&self, user_id: uuid::Uuid) -> Result<Profile, CrmError> {
        let profile = self
            .profiles
            .find_by_id(user_id)
            .await
            .map_err(CrmError::backend)?
            .ok_or(CrmError::ProfileMissing)?;

        if !profile.active {
            return Err(CrmError::AccountInactive);
        }
        Ok(profile)
    }

    async fn end_provider_session(&self, session: &AuthSession) {
        if let Err(failure) = self.auth.sign_out(session).await {
            tracing::warn!(user_id = %session.user_id, "Provider sign-out failed: {}", failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::auth::InMemoryAuthProvider;
    use crate::infrastructure::repositories::InMemoryStore;

    const DOMAIN: &str = "crm.test";

    async fn gate_with(username: &str, role: Role, active: bool) -> (SessionGate, Arc<InMemoryAuthProvider>) {
        let auth = Arc::new(InMemoryAuthProvider::new("gate-test-secret"));
        let store = Arc::new(InMemoryStore::new());

        let email = format!("{}@{}", username, DOMAIN);
        let user_id = auth.sign_up(&email, "parola123").await.unwrap();
        let mut profile = Profile::new(user_id, Username::new(username).unwrap(), role);
        profile.active = active;
        store.seed_profile(profile);

        let profiles: Arc<dyn ProfileRepository> = store;
        (SessionGate::new(auth.clone(), profiles, DOMAIN), auth)
    }

    #[tokio::test]
    async fn starts_in_checking_state() {
        let (gate, _) = gate_with("admin", Role::Admin, true).await;
        assert_eq!(gate.state(), &AuthState::Checking);
    }

    #[tokio::test]
    async fn authenticate_active_user() {
        let (mut gate, _) = gate_with("admin", Role::Admin, true).await;

        let profile = gate.authenticate("admin", "parola123").await.unwrap();

        assert_eq!(profile.username.as_str(), "admin");
        assert!(gate.is_admin());
        assert!(gate.access_token().is_some());
    }

    #[tokio::test]
    async fn blank_credentials_are_validation_errors() {
        let (mut gate, _) = gate_with("admin", Role::Admin, true).await;

        assert!(matches!(gate.authenticate(" ", "x").await, Err(CrmError::Validation(_))));
        assert!(matches!(gate.authenticate("admin", "").await, Err(CrmError::Validation(_))));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (mut gate, _) = gate_with("satis", Role::Sales, true).await;

        let result = gate.authenticate("satis", "wrong").await;

        assert!(matches!(result, Err(CrmError::Unauthorized)));
        assert_eq!(gate.state(), &AuthState::Anonymous);
    }

    #[tokio::test]
    async fn inactive_profile_is_refused_and_signed_out() {
        let (mut gate, auth) = gate_with("eski", Role::Sales, false).await;

        let result = gate.authenticate("eski", "parola123").await;

        assert!(matches!(result, Err(CrmError::AccountInactive)));
        assert_eq!(gate.current(), None);
        assert_eq!(auth.live_sessions(), 0);
    }

    #[tokio::test]
    async fn missing_profile_is_reported() {
        let auth = Arc::new(InMemoryAuthProvider::new("gate-test-secret"));
        auth.sign_up("ghost@crm.test", "parola123").await.unwrap();
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryStore::new());
        let mut gate = SessionGate::new(auth.clone(), profiles, DOMAIN);

        let result = gate.authenticate("ghost", "parola123").await;

        assert!(matches!(result, Err(CrmError::ProfileMissing)));
        assert_eq!(auth.live_sessions(), 0);
    }

    #[tokio::test]
    async fn restore_resumes_a_live_token() {
        let (mut gate, auth) = gate_with("admin", Role::Admin, true).await;
        gate.authenticate("admin", "parola123").await.unwrap();
        let token = gate.access_token().unwrap().to_string();

        let state = gate.restore(Some(&token)).await;
        assert!(matches!(state, AuthState::Authenticated(p) if p.username.as_str() == "admin"));

        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryStore::new());
        let mut fresh = SessionGate::new(auth, profiles, DOMAIN);
        // no profile row in this store
        assert_eq!(fresh.restore(Some(&token)).await, &AuthState::Anonymous);
    }

    #[tokio::test]
    async fn restore_without_token_is_anonymous() {
        let (mut gate, _) = gate_with("admin", Role::Admin, true).await;
        assert_eq!(gate.restore(None).await, &AuthState::Anonymous);
        assert_eq!(gate.restore(Some("garbage")).await, &AuthState::Anonymous);
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let (mut gate, auth) = gate_with("satis", Role::Sales, true).await;
        gate.authenticate("satis", "parola123").await.unwrap();

        gate.logout().await;

        assert_eq!(gate.state(), &AuthState::Anonymous);
        assert!(matches!(gate.require_actor(), Err(CrmError::Unauthorized)));
        assert_eq!(auth.live_sessions(), 0);
    }

    #[tokio::test]
    async fn sales_role_fails_admin_check() {
        let (mut gate, _) = gate_with("satis", Role::Sales, true).await;
        gate.authenticate("satis", "parola123").await.unwrap();

        assert!(matches!(gate.require_admin(), Err(CrmError::Forbidden(_))));
    }
}
