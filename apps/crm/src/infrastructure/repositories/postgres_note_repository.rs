use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::note::Note;
use crate::domain::repositories::NoteRepository;
use crate::domain::Timestamp;

#[derive(FromRow)]
struct NoteRow {
    id: Uuid,
    lead_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: String,
}

impl From<NoteRow> for Note {
    fn from(r: NoteRow) -> Self {
        Note::from_persistence(
            r.id,
            r.lead_id,
            r.author_id,
            r.text,
            Timestamp::parse(&r.created_at),
        )
    }
}

/// PostgreSQL implementation of NoteRepository over `lead_notes`
pub struct PostgresNoteRepository {
    pool: PgPool,
}

impl PostgresNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PostgresNoteRepository {
    async fn list_newest_first(&self) -> Result<Vec<Note>, String> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            r#"
            SELECT id, lead_id, author_id, text,
                   to_json(created_at) #>> '{}' AS created_at
            FROM lead_notes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to load notes: {}", e))?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn insert(&self, note: &Note) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO lead_notes (id, lead_id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5::timestamptz)
            "#,
        )
        .bind(note.id())
        .bind(note.lead_id())
        .bind(note.author_id())
        .bind(note.text())
        .bind(note.created_at().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert note: {}", e))?;

        Ok(())
    }
}
