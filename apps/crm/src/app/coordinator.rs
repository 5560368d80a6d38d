use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::app::confirm::{ConfirmationLedger, ConfirmationToken, PendingAction};
use crate::app::errors::{BulkTransferReport, CrmError};
use crate::app::store::Snapshot;
use crate::auth::{AuthFailure, AuthProvider};
use crate::config::CrmConfig;
use crate::domain::repositories::{LeadRepository, NoteRepository, ProfileRepository};
use crate::domain::{Lead, LeadForm, Note, Profile, Role, Username};

/// Knobs the coordinator enforces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPolicy {
    /// Reject a phone number already used by another lead
    pub strict_phone_uniqueness: bool,
    pub login_domain: String,
    pub confirmation_ttl: Duration,
}

impl From<&CrmConfig> for MutationPolicy {
    fn from(config: &CrmConfig) -> Self {
        Self {
            strict_phone_uniqueness: config.strict_phone_uniqueness,
            login_domain: config.login_domain.clone(),
            confirmation_ttl: config.confirmation_ttl,
        }
    }
}

/// What happened to the note submitted with a lead form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachedNote {
    NotRequested,
    Created(Uuid),
    /// The lead was saved, the note was not
    Failed(String),
}

/// Result of a lead save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSaved {
    pub lead_id: Uuid,
    pub created: bool,
    pub note: AttachedNote,
}

/// Admin form for creating or editing a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    /// `None` while creating
    pub id: Option<Uuid>,
    pub username: String,
    /// Only read on create; passwords are never changed through this form
    pub password: String,
    pub role: Role,
    pub active: bool,
}

impl UserForm {
    /// A blank creation form for a sales user
    pub fn empty() -> Self {
        Self {
            id: None,
            username: String::new(),
            password: String::new(),
            role: Role::Sales,
            active: true,
        }
    }

    /// An edit form pre-filled from a profile
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            id: Some(profile.id),
            username: profile.username.as_str().to_string(),
            password: String::new(),
            role: profile.role,
            active: profile.active,
        }
    }
}

/// Result of flipping a user's active flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub user_id: Uuid,
    pub active: bool,
    /// The actor just deactivated their own account
    pub forced_logout: bool,
}

/// Runs every write against the hosted store
///
/// Validation, uniqueness and role checks run against the caller's snapshot
/// before any backend call. Repository failures come back as
/// [`CrmError::BackendUnavailable`]. Refreshing the cache afterwards is the
/// caller's job.
pub struct MutationCoordinator {
    leads: Arc<dyn LeadRepository>,
    notes: Arc<dyn NoteRepository>,
    profiles: Arc<dyn ProfileRepository>,
    auth: Arc<dyn AuthProvider>,
    policy: MutationPolicy,
    confirmations: ConfirmationLedger,
}

impl MutationCoordinator {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        notes: Arc<dyn NoteRepository>,
        profiles: Arc<dyn ProfileRepository>,
        auth: Arc<dyn AuthProvider>,
        policy: MutationPolicy,
    ) -> Self {
        let confirmations = ConfirmationLedger::new(policy.confirmation_ttl);
        Self {
            leads,
            notes,
            profiles,
            auth,
            policy,
            confirmations,
        }
    }

    pub fn policy(&self) -> &MutationPolicy {
        &self.policy
    }

    // ===== Leads =====

    /// Creates or updates a lead, then attaches the pending note if any
    ///
    /// # Arguments
    /// * `actor` - The signed-in profile; default owner and note author
    /// * `snapshot` - Current cache, used for lookups and the phone check
    /// * `form` - The submitted form; `form.id` selects insert or update
    ///
    /// # Returns
    /// * `Ok(LeadSaved)` - The lead was written; `note` tells whether the
    ///   attached note made it too
    /// * `Err(CrmError)` - Nothing was written
    pub async fn save_lead(
        &self,
        actor: &Profile,
        snapshot: &Snapshot,
        form: &LeadForm,
        now: DateTime<Utc>,
    ) -> Result<LeadSaved, CrmError> {
        let lead = match form.id {
            None => Lead::new(form, actor.id, now).map_err(CrmError::Validation)?,
            Some(id) => {
                let mut lead = snapshot
                    .lead(id)
                    .cloned()
                    .ok_or_else(|| CrmError::NotFound(format!("Lead {}", id)))?;
                lead.apply(form, actor.id, now).map_err(CrmError::Validation)?;
                lead
            }
        };

        if self.policy.strict_phone_uniqueness {
            let taken = snapshot
                .leads
                .iter()
                .any(|other| other.id() != lead.id() && other.phone() == lead.phone());
            if taken {
                return Err(CrmError::DuplicatePhone(lead.phone().to_string()));
            }
        }

        let created = form.is_new();
        let written = if created {
            self.leads.insert(&lead).await
        } else {
            self.leads.update(&lead).await
        };
        written.map_err(|e| {
            tracing::error!(lead_id = %lead.id(), actor = %actor.id, "Lead save failed: {}", e);
            CrmError::backend(e)
        })?;
        tracing::info!(lead_id = %lead.id(), actor = %actor.id, created, "Lead saved");

        let note = match form.pending_note() {
            None => AttachedNote::NotRequested,
            Some(text) => self.attach_note(actor, lead.id(), text, now).await,
        };

        Ok(LeadSaved {
            lead_id: lead.id(),
            created,
            note,
        })
    }

    async fn attach_note(
        &self,
        actor: &Profile,
        lead_id: Uuid,
        text: &str,
        now: DateTime<Utc>,
    ) -> AttachedNote {
        let note = match Note::new(lead_id, actor.id, text, now) {
            Ok(note) => note,
            Err(e) => return AttachedNote::Failed(e),
        };
        match self.notes.insert(&note).await {
            Ok(()) => AttachedNote::Created(note.id()),
            Err(e) => {
                tracing::warn!(lead_id = %lead_id, "Lead saved but note failed: {}", e);
                AttachedNote::Failed(e)
            }
        }
    }

    /// Appends a note to an existing lead
    pub async fn add_standalone_note(
        &self,
        actor: &Profile,
        lead_id: Option<Uuid>,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CrmError> {
        let lead_id = lead_id.ok_or_else(|| CrmError::Validation("No lead selected".to_string()))?;
        let note = Note::new(lead_id, actor.id, text, now).map_err(CrmError::Validation)?;

        self.notes.insert(&note).await.map_err(CrmError::backend)?;
        tracing::info!(lead_id = %lead_id, note_id = %note.id(), actor = %actor.id, "Note added");
        Ok(note.id())
    }

    /// Hands a set of leads over to one owner
    ///
    /// Each lead is written by its own task; the tasks run concurrently and
    /// finish in no particular order. A lead missing from the snapshot counts
    /// as a failure without a backend call.
    ///
    /// # Returns
    /// * `Ok(BulkTransferReport)` - Every lead was transferred
    /// * `Err(CrmError::PartialTransfer)` - At least one lead was not; the
    ///   report lists both sides
    pub async fn bulk_transfer_owner(
        &self,
        actor: &Profile,
        snapshot: &Snapshot,
        lead_ids: &[Uuid],
        new_owner_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<BulkTransferReport, CrmError> {
        let new_owner_id =
            new_owner_id.ok_or_else(|| CrmError::Validation("No owner selected".to_string()))?;
        if lead_ids.is_empty() {
            return Err(CrmError::Validation("No leads selected".to_string()));
        }
        if snapshot.profile(new_owner_id).is_none() {
            return Err(CrmError::NotFound(format!("User {}", new_owner_id)));
        }

        let mut report = BulkTransferReport::default();
        let mut outstanding: HashSet<Uuid> = HashSet::new();
        let mut tasks = JoinSet::new();

        for &lead_id in lead_ids {
            let Some(lead) = snapshot.lead(lead_id) else {
                report.failed.push((lead_id, "Lead not found".to_string()));
                continue;
            };
            if !outstanding.insert(lead_id) {
                continue;
            }

            let mut lead = lead.clone();
            lead.reassign(new_owner_id, now);
            let leads = Arc::clone(&self.leads);
            tasks.spawn(async move {
                let result = leads.update(&lead).await;
                (lead_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((lead_id, Ok(()))) => {
                    outstanding.remove(&lead_id);
                    report.succeeded.push(lead_id);
                }
                Ok((lead_id, Err(e))) => {
                    outstanding.remove(&lead_id);
                    report.failed.push((lead_id, e));
                }
                Err(e) => tracing::error!("Transfer task aborted: {}", e),
            }
        }
        // tasks that died without reporting back
        for lead_id in outstanding {
            report.failed.push((lead_id, "Transfer task aborted".to_string()));
        }

        tracing::info!(
            actor = %actor.id,
            new_owner = %new_owner_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk owner transfer finished"
        );

        if report.is_complete() {
            Ok(report)
        } else {
            Err(CrmError::PartialTransfer(report))
        }
    }

    // ===== Users =====

    /// Creates a user (provider identity plus profile) or edits a profile
    ///
    /// Admin only. Returns the user's id.
    pub async fn save_user(
        &self,
        actor: &Profile,
        snapshot: &Snapshot,
        form: &UserForm,
    ) -> Result<Uuid, CrmError> {
        require_admin(actor)?;

        if form.username.trim().is_empty() {
            return Err(CrmError::Validation("Username is required".to_string()));
        }
        let username = Username::new(&form.username).map_err(CrmError::Validation)?;

        let taken = snapshot
            .profiles
            .iter()
            .any(|profile| Some(profile.id) != form.id && profile.username.matches(username.as_str()));
        if taken {
            return Err(CrmError::DuplicateUsername(username.to_string()));
        }

        match form.id {
            None => self.create_user(actor, username, form).await,
            Some(id) => {
                let mut profile = snapshot
                    .profile(id)
                    .cloned()
                    .ok_or_else(|| CrmError::NotFound(format!("User {}", id)))?;
                profile.username = username;
                profile.role = form.role;
                profile.active = form.active;

                self.profiles.update(&profile).await.map_err(CrmError::backend)?;
                tracing::info!(user_id = %id, actor = %actor.id, "User updated");
                Ok(id)
            }
        }
    }

    async fn create_user(
        &self,
        actor: &Profile,
        username: Username,
        form: &UserForm,
    ) -> Result<Uuid, CrmError> {
        if form.password.is_empty() {
            return Err(CrmError::Validation("Password is required".to_string()));
        }

        let email = username.login_email(&self.policy.login_domain);
        let user_id = self
            .auth
            .sign_up(&email, &form.password)
            .await
            .map_err(|failure| match failure {
                AuthFailure::Rejected(reason) => CrmError::Validation(reason),
                AuthFailure::Unavailable(reason) => CrmError::BackendUnavailable(reason),
            })?;

        let mut profile = Profile::new(user_id, username, form.role);
        profile.active = form.active;
        self.profiles.insert(&profile).await.map_err(|e| {
            tracing::error!(user_id = %user_id, "Identity created but profile insert failed: {}", e);
            CrmError::backend(e)
        })?;

        tracing::info!(user_id = %user_id, actor = %actor.id, role = %profile.role, "User created");
        Ok(user_id)
    }

    /// Flips a user's active flag
    ///
    /// Admin only. Deactivating one's own account sets `forced_logout`.
    pub async fn toggle_user_active(
        &self,
        actor: &Profile,
        snapshot: &Snapshot,
        user_id: Uuid,
    ) -> Result<ToggleOutcome, CrmError> {
        require_admin(actor)?;

        let mut profile = snapshot
            .profile(user_id)
            .cloned()
            .ok_or_else(|| CrmError::NotFound(format!("User {}", user_id)))?;
        profile.active = !profile.active;

        self.profiles.update(&profile).await.map_err(CrmError::backend)?;
        tracing::info!(user_id = %user_id, actor = %actor.id, active = profile.active, "User activation changed");

        Ok(ToggleOutcome {
            user_id,
            active: profile.active,
            forced_logout: user_id == actor.id && !profile.active,
        })
    }

    // ===== Two-step deletes =====

    /// First step of a lead delete. Admin only.
    pub fn request_delete_lead(
        &mut self,
        actor: &Profile,
        snapshot: &Snapshot,
        lead_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationToken, CrmError> {
        require_admin(actor)?;
        if snapshot.lead(lead_id).is_none() {
            return Err(CrmError::NotFound(format!("Lead {}", lead_id)));
        }

        Ok(self
            .confirmations
            .issue(actor.id, PendingAction::DeleteLead(lead_id), now))
    }

    /// First step of a user delete
    ///
    /// Admin only. Refused for the actor's own account and for a user that
    /// still owns leads, counted on the backend rather than the cache.
    pub async fn request_delete_user(
        &mut self,
        actor: &Profile,
        snapshot: &Snapshot,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ConfirmationToken, CrmError> {
        require_admin(actor)?;
        if user_id == actor.id {
            return Err(CrmError::forbidden("You cannot delete your own account"));
        }
        if snapshot.profile(user_id).is_none() {
            return Err(CrmError::NotFound(format!("User {}", user_id)));
        }
        self.ensure_no_dependent_leads(user_id).await?;

        Ok(self
            .confirmations
            .issue(actor.id, PendingAction::DeleteUser(user_id), now))
    }

    /// Second step: performs the action behind a token
    pub async fn confirm(
        &mut self,
        actor: &Profile,
        token: ConfirmationToken,
        now: DateTime<Utc>,
    ) -> Result<PendingAction, CrmError> {
        require_admin(actor)?;
        let action = self.confirmations.redeem(token, actor.id, now)?;

        match action {
            PendingAction::DeleteLead(lead_id) => {
                let removed = self.leads.delete(lead_id).await.map_err(CrmError::backend)?;
                tracing::info!(lead_id = %lead_id, actor = %actor.id, notes = removed, "Lead deleted");
            }
            PendingAction::DeleteUser(user_id) => {
                // ownership may have changed since the request
                self.ensure_no_dependent_leads(user_id).await?;
                self.profiles.delete(user_id).await.map_err(CrmError::backend)?;
                tracing::info!(user_id = %user_id, actor = %actor.id, "User deleted");
            }
        }
        Ok(action)
    }

    /// Drops a pending confirmation
    pub fn cancel(&mut self, actor: &Profile, token: ConfirmationToken) -> Result<PendingAction, CrmError> {
        self.confirmations.cancel(token, actor.id)
    }

    /// Forgets all pending confirmations
    pub fn clear_confirmations(&mut self) {
        self.confirmations.clear();
    }

    async fn ensure_no_dependent_leads(&self, user_id: Uuid) -> Result<(), CrmError> {
        let lead_count = self
            .leads
            .count_by_owner(user_id)
            .await
            .map_err(CrmError::backend)?;
        if lead_count > 0 {
            return Err(CrmError::HasDependentLeads { user_id, lead_count });
        }
        Ok(())
    }
}

fn require_admin(actor: &Profile) -> Result<(), CrmError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CrmError::forbidden("Admin role required"))
    }
}
