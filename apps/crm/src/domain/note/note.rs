use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::timestamp::Timestamp;

/// An entry in a lead's contact history
///
/// Notes are append-only: there is no way to edit one once written, and they
/// disappear only together with their lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    id: Uuid,
    lead_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: Timestamp,
}

impl Note {
    /// Writes a new note on a lead
    ///
    /// # Returns
    /// * `Ok(Note)` - The note, with its text trimmed
    /// * `Err(String)` - If the text is blank
    pub fn new(
        lead_id: Uuid,
        author_id: Uuid,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("Note text cannot be empty".to_string());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            lead_id,
            author_id,
            text: text.to_string(),
            created_at: Timestamp::from(now),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the lead this note belongs to
    pub fn lead_id(&self) -> Uuid {
        self.lead_id
    }

    /// Returns the user who wrote the note
    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Reconstructs a Note from persistence layer data
    pub fn from_persistence(
        id: Uuid,
        lead_id: Uuid,
        author_id: Uuid,
        text: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            lead_id,
            author_id,
            text,
            created_at,
        }
    }
}
