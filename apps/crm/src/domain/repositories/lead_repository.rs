use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::lead::Lead;

/// Repository trait for the Lead aggregate
///
/// Maps onto the `leads` collection of the hosted store.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Load every lead, newest created first
    async fn list_newest_first(&self) -> Result<Vec<Lead>, String>;

    /// Find a lead by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, String>;

    /// Insert a new lead
    async fn insert(&self, lead: &Lead) -> Result<(), String>;

    /// Overwrite an existing lead; fails if the lead no longer exists
    async fn update(&self, lead: &Lead) -> Result<(), String>;

    /// Delete a lead together with its notes, as one unit
    ///
    /// Either both go or neither does. Returns how many notes were removed.
    async fn delete(&self, id: Uuid) -> Result<u64, String>;

    /// Count the leads owned by a user
    async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64, String>;
}
