// In-memory store
// Backs all three repository traits for tests and local development

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::repositories::{LeadRepository, NoteRepository, ProfileRepository};
use crate::domain::{Lead, Note, Profile};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    /// Insertion order
    leads: Vec<Lead>,
    /// Insertion order
    notes: Vec<Note>,
}

/// In-memory implementation of the lead, note and profile repositories
///
/// One instance stands in for the whole hosted store, so a single `Arc` can
/// be handed out as every repository.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failing_updates: RwLock<HashSet<Uuid>>,
    failing_deletes: RwLock<HashSet<Uuid>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile directly (for testing purposes)
    pub fn seed_profile(&self, profile: Profile) {
        self.write().profiles.push(profile);
    }

    /// Insert a lead directly (for testing purposes)
    pub fn seed_lead(&self, lead: Lead) {
        self.write().leads.push(lead);
    }

    /// Insert a note directly (for testing purposes)
    pub fn seed_note(&self, note: Note) {
        self.write().notes.push(note);
    }

    /// Make every later update of this lead fail (for testing purposes)
    pub fn fail_updates_for(&self, lead_id: Uuid) {
        self.failing_updates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lead_id);
    }

    /// Make every later delete of this lead fail (for testing purposes)
    pub fn fail_deletes_for(&self, lead_id: Uuid) {
        self.failing_deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lead_id);
    }

    /// Make every call fail as if the backend were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<(), String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("Backend unavailable".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn list_newest_first(&self) -> Result<Vec<Lead>, String> {
        self.ensure_available()?;
        let mut leads: Vec<Lead> = self.read().leads.iter().rev().cloned().collect();
        // stable: equal timestamps keep latest insert first
        leads.sort_by(|a, b| b.created_at().as_datetime().cmp(&a.created_at().as_datetime()));
        Ok(leads)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, String> {
        self.ensure_available()?;
        Ok(self.read().leads.iter().find(|lead| lead.id() == id).cloned())
    }

    async fn insert(&self, lead: &Lead) -> Result<(), String> {
        self.ensure_available()?;
        let mut tables = self.write();
        if tables.leads.iter().any(|existing| existing.id() == lead.id()) {
            return Err(format!("Lead already exists: {}", lead.id()));
        }
        tables.leads.push(lead.clone());
        Ok(())
    }

    async fn update(&self, lead: &Lead) -> Result<(), String> {
        self.ensure_available()?;
        let failing = self
            .failing_updates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&lead.id());
        if failing {
            return Err(format!("Failed to update lead: {}", lead.id()));
        }

        let mut tables = self.write();
        let slot = tables
            .leads
            .iter_mut()
            .find(|existing| existing.id() == lead.id())
            .ok_or_else(|| format!("Lead not found: {}", lead.id()))?;
        *slot = lead.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<u64, String> {
        self.ensure_available()?;
        let failing = self
            .failing_deletes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id);
        if failing {
            return Err(format!("Failed to delete lead: {}", id));
        }

        let mut tables = self.write();
        if !tables.leads.iter().any(|lead| lead.id() == id) {
            return Err(format!("Lead not found: {}", id));
        }
        tables.leads.retain(|lead| lead.id() != id);
        let before = tables.notes.len();
        tables.notes.retain(|note| note.lead_id() != id);
        Ok((before - tables.notes.len()) as u64)
    }

    async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64, String> {
        self.ensure_available()?;
        let count = self
            .read()
            .leads
            .iter()
            .filter(|lead| lead.owner_id() == Some(owner_id))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl NoteRepository for InMemoryStore {
    async fn list_newest_first(&self) -> Result<Vec<Note>, String> {
        self.ensure_available()?;
        let mut notes: Vec<Note> = self.read().notes.iter().rev().cloned().collect();
        notes.sort_by(|a, b| b.created_at().as_datetime().cmp(&a.created_at().as_datetime()));
        Ok(notes)
    }

    async fn insert(&self, note: &Note) -> Result<(), String> {
        self.ensure_available()?;
        let mut tables = self.write();
        if !tables.leads.iter().any(|lead| lead.id() == note.lead_id()) {
            return Err(format!("Lead not found: {}", note.lead_id()));
        }
        tables.notes.push(note.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Profile>, String> {
        self.ensure_available()?;
        let mut profiles = self.read().profiles.clone();
        profiles.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(profiles)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, String> {
        self.ensure_available()?;
        Ok(self.read().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, profile: &Profile) -> Result<(), String> {
        self.ensure_available()?;
        let mut tables = self.write();
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(format!("Profile already exists: {}", profile.id));
        }
        tables.profiles.push(profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<(), String> {
        self.ensure_available()?;
        let mut tables = self.write();
        let slot = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or_else(|| format!("Profile not found: {}", profile.id))?;
        *slot = profile.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        self.ensure_available()?;
        let mut tables = self.write();
        let before = tables.profiles.len();
        tables.profiles.retain(|p| p.id != id);
        if tables.profiles.len() == before {
            return Err(format!("Profile not found: {}", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadForm, Role, Username};
    use chrono::{Duration, TimeZone, Utc};

    fn lead_at(name: &str, owner: Uuid, hour: u32) -> Lead {
        let mut form = LeadForm::empty(None);
        form.name = name.to_string();
        form.phone = format!("0555{}", hour);
        let at = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        Lead::new(&form, owner, at).unwrap()
    }

    #[tokio::test]
    async fn leads_are_listed_newest_first() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store.seed_lead(lead_at("early", owner, 8));
        store.seed_lead(lead_at("late", owner, 18));
        store.seed_lead(lead_at("noon", owner, 12));

        let names: Vec<String> = LeadRepository::list_newest_first(&store)
            .await
            .unwrap()
            .iter()
            .map(|l| l.name().to_string())
            .collect();

        assert_eq!(names, vec!["late", "noon", "early"]);
    }

    #[tokio::test]
    async fn update_of_missing_lead_fails() {
        let store = InMemoryStore::new();
        let lead = lead_at("ghost", Uuid::new_v4(), 9);

        assert!(LeadRepository::update(&store, &lead).await.is_err());
    }

    #[tokio::test]
    async fn injected_update_failure() {
        let store = InMemoryStore::new();
        let mut lead = lead_at("Ahmet", Uuid::new_v4(), 9);
        store.seed_lead(lead.clone());
        store.fail_updates_for(lead.id());

        lead.reassign(Uuid::new_v4(), Utc::now());

        assert!(LeadRepository::update(&store, &lead).await.is_err());
    }

    #[tokio::test]
    async fn count_by_owner_counts_only_that_owner() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store.seed_lead(lead_at("a", owner, 9));
        store.seed_lead(lead_at("b", owner, 10));
        store.seed_lead(lead_at("c", Uuid::new_v4(), 11));

        assert_eq!(store.count_by_owner(owner).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lead_delete_takes_only_its_notes() {
        let store = InMemoryStore::new();
        let author = Uuid::new_v4();
        let a = lead_at("a", author, 9);
        let b = lead_at("b", author, 10);
        let now = Utc::now();
        store.seed_note(Note::new(a.id(), author, "one", now).unwrap());
        store.seed_note(Note::new(a.id(), author, "two", now + Duration::minutes(1)).unwrap());
        store.seed_note(Note::new(b.id(), author, "three", now).unwrap());

        store.seed_lead(a.clone());
        store.seed_lead(b);
        assert_eq!(LeadRepository::delete(&store, a.id()).await.unwrap(), 2);
        assert_eq!(NoteRepository::list_newest_first(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_lead_delete_keeps_its_notes() {
        let store = InMemoryStore::new();
        let author = Uuid::new_v4();
        let lead = lead_at("a", author, 9);
        store.seed_lead(lead.clone());
        store.seed_note(Note::new(lead.id(), author, "one", Utc::now()).unwrap());
        store.fail_deletes_for(lead.id());

        assert!(LeadRepository::delete(&store, lead.id()).await.is_err());
        assert_eq!(NoteRepository::list_newest_first(&store).await.unwrap().len(), 1);
        assert!(LeadRepository::find_by_id(&store, lead.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn note_on_unknown_lead_is_rejected() {
        let store = InMemoryStore::new();
        let note = Note::new(Uuid::new_v4(), Uuid::new_v4(), "orphan", Utc::now()).unwrap();

        assert!(NoteRepository::insert(&store, &note).await.is_err());
    }

    #[tokio::test]
    async fn profiles_are_ordered_by_username() {
        let store = InMemoryStore::new();
        store.seed_profile(Profile::new(Uuid::new_v4(), Username::new("zeynep").unwrap(), Role::Sales));
        store.seed_profile(Profile::new(Uuid::new_v4(), Username::new("admin").unwrap(), Role::Admin));

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.username.to_string())
            .collect();

        assert_eq!(names, vec!["admin", "zeynep"]);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);

        assert!(store.list().await.is_err());
        assert!(store.count_by_owner(Uuid::new_v4()).await.is_err());
    }
}
