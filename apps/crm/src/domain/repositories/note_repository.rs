use async_trait::async_trait;

use crate::domain::note::Note;

/// Repository trait for lead notes
///
/// Notes are append-only, so there is no update operation.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Load every note, newest created first
    async fn list_newest_first(&self) -> Result<Vec<Note>, String>;

    /// Append a note
    async fn insert(&self, note: &Note) -> Result<(), String>;
}
