use std::sync::Arc;

use chrono::{Local, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::app::confirm::{ConfirmationToken, PendingAction};
use crate::app::coordinator::{LeadSaved, MutationCoordinator, MutationPolicy, ToggleOutcome, UserForm};
use crate::app::errors::{BulkTransferReport, CrmError};
use crate::app::session::{AuthState, SessionGate};
use crate::app::store::{RecordStore, Snapshot};
use crate::app::view::LeadView;
use crate::auth::AuthProvider;
use crate::config::CrmConfig;
use crate::domain::repositories::{LeadRepository, NoteRepository, ProfileRepository};
use crate::domain::{Lead, LeadForm, Profile};
use crate::export::{export_csv, export_file_name};
use crate::infrastructure::auth::{HostedAuthProvider, InMemoryAuthProvider};
use crate::infrastructure::repositories::{
    InMemoryStore, PostgresLeadRepository, PostgresNoteRepository, PostgresProfileRepository,
};
use crate::query::{compute_status_counts, StatusCounts};

/// The adapters a session talks to
#[derive(Clone)]
pub struct Backend {
    pub leads: Arc<dyn LeadRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    /// Wires one in-memory store behind all three repositories
    pub fn in_memory(store: Arc<InMemoryStore>, auth: Arc<InMemoryAuthProvider>) -> Self {
        Self {
            leads: store.clone(),
            notes: store.clone(),
            profiles: store,
            auth,
        }
    }
}

/// One user session from startup to logout
///
/// Owns the session gate, the record cache, the mutation coordinator and the
/// lead view. Every mutation is followed by a full reload; a reload that
/// fails after a successful write leaves the cache marked stale instead of
/// failing the write.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use leaddesk_crm::app::{AppContext, AuthState, Backend};
/// use leaddesk_crm::config::CrmConfig;
/// use leaddesk_crm::infrastructure::auth::InMemoryAuthProvider;
/// use leaddesk_crm::infrastructure::repositories::InMemoryStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = Backend::in_memory(
///     Arc::new(InMemoryStore::new()),
///     Arc::new(InMemoryAuthProvider::new("doc-secret")),
/// );
/// let mut ctx = AppContext::new(CrmConfig::default(), backend);
/// ctx.restore(None).await;
/// assert_eq!(ctx.state(), &AuthState::Anonymous);
/// # }
/// ```
pub struct AppContext {
    config: CrmConfig,
    gate: SessionGate,
    store: RecordStore,
    coordinator: MutationCoordinator,
    view: LeadView,
}

impl AppContext {
    pub fn new(config: CrmConfig, backend: Backend) -> Self {
        let gate = SessionGate::new(
            backend.auth.clone(),
            backend.profiles.clone(),
            config.login_domain.clone(),
        );
        let store = RecordStore::new(
            backend.leads.clone(),
            backend.notes.clone(),
            backend.profiles.clone(),
        );
        let coordinator = MutationCoordinator::new(
            backend.leads,
            backend.notes,
            backend.profiles,
            backend.auth,
            MutationPolicy::from(&config),
        );

        Self {
            config,
            gate,
            store,
            coordinator,
            view: LeadView::default(),
        }
    }

    /// Connects to the hosted Postgres store and auth provider
    pub async fn connect(config: CrmConfig) -> Result<Self, CrmError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.backend_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| CrmError::backend(format!("Failed to connect to database: {}", e)))?;
        tracing::info!("Database connection established");

        let auth = HostedAuthProvider::new(
            &config.auth_url,
            &config.auth_api_key,
            config.jwt_secret.clone(),
            config.backend_timeout,
        )
        .map_err(CrmError::backend)?;

        let backend = Backend {
            leads: Arc::new(PostgresLeadRepository::new(pool.clone())),
            notes: Arc::new(PostgresNoteRepository::new(pool.clone())),
            profiles: Arc::new(PostgresProfileRepository::new(pool)),
            auth: Arc::new(auth),
        };
        Ok(Self::new(config, backend))
    }

    // ===== Session =====

    /// Signs in and performs the initial load
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Profile, CrmError> {
        let profile = self.gate.authenticate(username, password).await?;
        self.refresh().await;
        Ok(profile)
    }

    /// Resumes a stored session at startup, loading data when it succeeds
    pub async fn restore(&mut self, access_token: Option<&str>) -> &AuthState {
        if matches!(self.gate.restore(access_token).await, AuthState::Authenticated(_)) {
            self.refresh().await;
        }
        self.gate.state()
    }

    /// Ends the session and forgets everything it loaded
    pub async fn logout(&mut self) {
        self.gate.logout().await;
        self.store.clear();
        self.view.reset();
        self.coordinator.clear_confirmations();
    }

    pub fn state(&self) -> &AuthState {
        self.gate.state()
    }

    pub fn current_user(&self) -> Option<&Profile> {
        self.gate.current()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.gate.access_token()
    }

    // ===== Cache =====

    /// Reloads every collection on demand
    ///
    /// Ends the session with `Unauthorized` when the signed-in profile has
    /// been removed or deactivated.
    pub async fn reload(&mut self) -> Result<&Snapshot, CrmError> {
        self.gate.require_actor()?;
        self.store.reload().await?;
        self.sync_actor().await;
        // the load may have ended the session
        self.gate.require_actor()?;
        Ok(self.store.snapshot())
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// True when the cache could not be refreshed after the last write
    pub fn is_stale(&self) -> bool {
        self.store.is_stale()
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    // ===== View =====

    pub fn view(&self) -> &LeadView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut LeadView {
        &mut self.view
    }

    /// Leads passing the current filters, in load order
    pub fn visible_leads(&self) -> Vec<&Lead> {
        self.view.visible(&self.store.snapshot().leads)
    }

    /// Per-status counts over the whole cached lead pool
    pub fn status_counts(&self) -> StatusCounts {
        compute_status_counts(&self.store.snapshot().leads)
    }

    /// Selects or deselects every visible lead
    pub fn toggle_select_all(&mut self) {
        let visible = self.view.visible(&self.store.snapshot().leads);
        self.view.toggle_all(&visible);
    }

    /// Encodes the visible leads
    ///
    /// # Returns
    /// * `Ok((file_name, bytes))` - Name stamped with today's local date
    /// * `Err(CrmError::EmptyResult)` - Nothing passes the filters
    pub fn export_csv(&self) -> Result<(String, Vec<u8>), CrmError> {
        self.gate.require_actor()?;
        let snapshot = self.store.snapshot();
        let visible = self.view.visible(&snapshot.leads);
        let bytes = export_csv(&visible, &snapshot.profiles, &snapshot.notes)?;

        tracing::info!(rows = visible.len(), "Leads exported");
        Ok((export_file_name(Local::now().date_naive()), bytes))
    }

    // ===== Mutations =====

    pub async fn save_lead(&mut self, form: &LeadForm) -> Result<LeadSaved, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let saved = self
            .coordinator
            .save_lead(&actor, self.store.snapshot(), form, Utc::now())
            .await?;
        self.refresh().await;
        Ok(saved)
    }

    pub async fn add_note(&mut self, lead_id: Option<Uuid>, text: &str) -> Result<Uuid, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let note_id = self
            .coordinator
            .add_standalone_note(&actor, lead_id, text, Utc::now())
            .await?;
        self.refresh().await;
        Ok(note_id)
    }

    /// Transfers the ticked leads, clearing the selection once all succeed
    pub async fn transfer_selected(
        &mut self,
        new_owner_id: Option<Uuid>,
    ) -> Result<BulkTransferReport, CrmError> {
        let lead_ids = self.view.selection().ids().to_vec();
        let report = self.bulk_transfer_owner(&lead_ids, new_owner_id).await?;
        self.view.clear_selection();
        Ok(report)
    }

    /// Transfers leads to one owner and reloads whatever the outcome
    pub async fn bulk_transfer_owner(
        &mut self,
        lead_ids: &[Uuid],
        new_owner_id: Option<Uuid>,
    ) -> Result<BulkTransferReport, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let outcome = self
            .coordinator
            .bulk_transfer_owner(&actor, self.store.snapshot(), lead_ids, new_owner_id, Utc::now())
            .await;
        if matches!(outcome, Ok(_) | Err(CrmError::PartialTransfer(_))) {
            self.refresh().await;
        }
        outcome
    }

    pub fn request_delete_lead(&mut self, lead_id: Uuid) -> Result<ConfirmationToken, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        self.coordinator
            .request_delete_lead(&actor, self.store.snapshot(), lead_id, Utc::now())
    }

    pub async fn request_delete_user(&mut self, user_id: Uuid) -> Result<ConfirmationToken, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        self.coordinator
            .request_delete_user(&actor, self.store.snapshot(), user_id, Utc::now())
            .await
    }

    /// Performs a confirmed delete
    pub async fn confirm(&mut self, token: ConfirmationToken) -> Result<PendingAction, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let action = self.coordinator.confirm(&actor, token, Utc::now()).await?;
        if let PendingAction::DeleteLead(lead_id) = action {
            if self.view.selection().contains(lead_id) {
                self.view.toggle_selected(lead_id);
            }
        }
        self.refresh().await;
        Ok(action)
    }

    pub fn cancel(&mut self, token: ConfirmationToken) -> Result<PendingAction, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        self.coordinator.cancel(&actor, token)
    }

    pub async fn save_user(&mut self, form: &UserForm) -> Result<Uuid, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let user_id = self
            .coordinator
            .save_user(&actor, self.store.snapshot(), form)
            .await?;

        if user_id == actor.id && !form.active {
            tracing::info!(user_id = %user_id, "Own account deactivated, ending session");
            self.logout().await;
        } else {
            self.refresh().await;
        }
        Ok(user_id)
    }

    /// Flips a user's active flag; deactivating oneself ends the session
    pub async fn toggle_user_active(&mut self, user_id: Uuid) -> Result<ToggleOutcome, CrmError> {
        let actor = self.gate.require_actor()?.clone();
        let outcome = self
            .coordinator
            .toggle_user_active(&actor, self.store.snapshot(), user_id)
            .await?;

        if outcome.forced_logout {
            tracing::info!(user_id = %user_id, "Own account deactivated, ending session");
            self.logout().await;
        } else {
            self.refresh().await;
        }
        Ok(outcome)
    }

    /// Post-write reload; failure marks the cache stale and is not returned
    async fn refresh(&mut self) {
        if let Err(e) = self.store.reload().await {
            tracing::warn!("Cache is stale after write: {}", e);
            return;
        }
        self.sync_actor().await;
    }

    /// Picks up changes to the signed-in profile from the latest load
    ///
    /// An actor whose profile is gone or deactivated is logged out.
    async fn sync_actor(&mut self) {
        let Some(actor_id) = self.gate.current().map(|actor| actor.id) else {
            return;
        };

        match self.store.profile(actor_id).cloned() {
            Some(latest) if latest.active => self.gate.refresh_actor(&latest),
            _ => {
                tracing::info!(user_id = %actor_id, "Signed-in account removed or deactivated, ending session");
                self.logout().await;
            }
        }
    }
}
