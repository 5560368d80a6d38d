use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::Profile;

/// Repository trait for user profiles
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Load every profile, ordered by username
    async fn list(&self) -> Result<Vec<Profile>, String>;

    /// Find a profile by the identity issued by the auth provider
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, String>;

    /// Insert a new profile
    async fn insert(&self, profile: &Profile) -> Result<(), String>;

    /// Overwrite username, role and active flag of an existing profile
    async fn update(&self, profile: &Profile) -> Result<(), String>;

    /// Delete a profile by ID
    async fn delete(&self, id: Uuid) -> Result<(), String>;
}
