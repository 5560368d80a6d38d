use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::app::errors::CrmError;
use crate::domain::repositories::{LeadRepository, NoteRepository, ProfileRepository};
use crate::domain::{Lead, Note, Profile};

/// One consistent copy of every collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Ordered by username
    pub profiles: Vec<Profile>,
    /// Newest created first
    pub leads: Vec<Lead>,
    /// Newest created first
    pub notes: Vec<Note>,
}

impl Snapshot {
    pub fn lead(&self, id: Uuid) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id() == id)
    }

    pub fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    /// Resolves a user id to its username for display
    pub fn username_of(&self, id: Uuid) -> Option<&str> {
        self.profile(id).map(|profile| profile.username.as_str())
    }

    /// Notes of one lead, newest first
    ///
    /// Re-sorted on every call; notes with an unreadable timestamp go last.
    pub fn notes_for(&self, lead_id: Uuid) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| note.lead_id() == lead_id)
            .collect();
        notes.sort_by(|a, b| {
            b.created_at()
                .as_datetime()
                .cmp(&a.created_at().as_datetime())
        });
        notes
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.leads.is_empty() && self.notes.is_empty()
    }
}

/// In-memory mirror of the hosted store
///
/// The snapshot is only ever replaced as a whole. A failed reload keeps the
/// previous snapshot and marks the cache stale until the next good one.
pub struct RecordStore {
    leads: Arc<dyn LeadRepository>,
    notes: Arc<dyn NoteRepository>,
    profiles: Arc<dyn ProfileRepository>,
    snapshot: Snapshot,
    last_error: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl RecordStore {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        notes: Arc<dyn NoteRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            leads,
            notes,
            profiles,
            snapshot: Snapshot::default(),
            last_error: None,
            loaded_at: None,
        }
    }

    /// Fetches all three collections and swaps in the new snapshot
    ///
    /// # Returns
    /// * `Ok(&Snapshot)` - The freshly loaded snapshot
    /// * `Err(CrmError::BackendUnavailable)` - Any fetch failed; the previous
    ///   snapshot is still in place
    pub async fn reload(&mut self) -> Result<&Snapshot, CrmError> {
        let fetched = tokio::try_join!(
            self.profiles.list(),
            self.leads.list_newest_first(),
            self.notes.list_newest_first(),
        );

        match fetched {
            Ok((profiles, leads, notes)) => {
                tracing::debug!(
                    profiles = profiles.len(),
                    leads = leads.len(),
                    notes = notes.len(),
                    "Snapshot reloaded"
                );
                self.snapshot = Snapshot {
                    profiles,
                    leads,
                    notes,
                };
                self.last_error = None;
                self.loaded_at = Some(Utc::now());
                Ok(&self.snapshot)
            }
            Err(e) => {
                tracing::warn!("Reload failed, keeping previous snapshot: {}", e);
                self.last_error = Some(e.clone());
                Err(CrmError::BackendUnavailable(e))
            }
        }
    }

    /// Drops every cached record
    pub fn clear(&mut self) {
        self.snapshot = Snapshot::default();
        self.last_error = None;
        self.loaded_at = None;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// True when the last reload failed
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the current snapshot was fetched
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn lead(&self, id: Uuid) -> Option<&Lead> {
        self.snapshot.lead(id)
    }

    pub fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.snapshot.profile(id)
    }

    pub fn username_of(&self, id: Uuid) -> Option<&str> {
        self.snapshot.username_of(id)
    }

    pub fn notes_for(&self, lead_id: Uuid) -> Vec<&Note> {
        self.snapshot.notes_for(lead_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadForm, Role, Timestamp, Username};
    use crate::infrastructure::repositories::InMemoryStore;
    use chrono::{Duration, TimeZone};

    fn record_store(backend: &Arc<InMemoryStore>) -> RecordStore {
        RecordStore::new(backend.clone(), backend.clone(), backend.clone())
    }

    fn seeded() -> (Arc<InMemoryStore>, Uuid, Uuid) {
        let backend = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        backend.seed_profile(Profile::new(owner, Username::new("satis").unwrap(), Role::Sales));

        let mut form = LeadForm::empty(Some(owner));
        form.name = "Ahmet".to_string();
        form.phone = "05551234567".to_string();
        let lead = Lead::new(&form, owner, Utc::now()).unwrap();
        let lead_id = lead.id();
        backend.seed_lead(lead);
        (backend, owner, lead_id)
    }

    #[tokio::test]
    async fn reload_replaces_snapshot() {
        let (backend, owner, lead_id) = seeded();
        let mut store = record_store(&backend);

        let snapshot = store.reload().await.unwrap();

        assert_eq!(snapshot.leads.len(), 1);
        assert_eq!(snapshot.username_of(owner), Some("satis"));
        assert!(store.lead(lead_id).is_some());
        assert!(!store.is_stale());
        assert!(store.loaded_at().is_some());
    }

    #[tokio::test]
    async fn reload_is_idempotent() {
        let (backend, _, _) = seeded();
        let mut store = record_store(&backend);

        let first = store.reload().await.unwrap().clone();
        let second = store.reload().await.unwrap().clone();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let (backend, _, lead_id) = seeded();
        let mut store = record_store(&backend);
        store.reload().await.unwrap();

        backend.set_unavailable(true);
        let result = store.reload().await;

        assert!(matches!(result, Err(CrmError::BackendUnavailable(_))));
        assert!(store.is_stale());
        assert!(store.lead(lead_id).is_some());

        backend.set_unavailable(false);
        store.reload().await.unwrap();
        assert!(!store.is_stale());
    }

    #[tokio::test]
    async fn clear_empties_everything() {
        let (backend, _, _) = seeded();
        let mut store = record_store(&backend);
        store.reload().await.unwrap();

        store.clear();

        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn notes_for_sorts_newest_first() {
        let lead_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        let old = Note::new(lead_id, author, "first call", base).unwrap();
        let new = Note::new(lead_id, author, "second call", base + Duration::hours(2)).unwrap();
        let broken = Note::from_persistence(
            Uuid::new_v4(),
            lead_id,
            author,
            "unknown time".to_string(),
            Timestamp::parse("not a date"),
        );
        let other = Note::new(Uuid::new_v4(), author, "elsewhere", base).unwrap();

        let snapshot = Snapshot {
            notes: vec![broken, old, other, new],
            ..Snapshot::default()
        };

        let texts: Vec<&str> = snapshot.notes_for(lead_id).iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["second call", "first call", "unknown time"]);
    }
}
