use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::lead::{Lead, LeadStatus, Phone};
use crate::domain::repositories::LeadRepository;
use crate::domain::Timestamp;

use super::{parse_optional, readable_rows};

// Timestamps are read back as ISO text so a bad value can still load
const SELECT_LEADS: &str = r#"
    SELECT
        id, name, phone, language, source, status, stage, quote, owner_id,
        to_json(created_at) #>> '{}' AS created_at,
        to_json(updated_at) #>> '{}' AS updated_at
    FROM leads
"#;

#[derive(FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    phone: String,
    language: Option<String>,
    source: Option<String>,
    status: String,
    stage: Option<String>,
    quote: Option<String>,
    owner_id: Option<Uuid>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<LeadRow> for Lead {
    type Error = String;

    fn try_from(r: LeadRow) -> Result<Self, Self::Error> {
        let status: LeadStatus = r
            .status
            .parse()
            .map_err(|e| format!("Lead {}: {}", r.id, e))?;

        Ok(Lead::from_persistence(
            r.id,
            r.name,
            Phone::from_persistence(r.phone),
            parse_optional(r.language),
            parse_optional(r.source),
            status,
            parse_optional(r.stage),
            r.quote,
            r.owner_id,
            Timestamp::parse(&r.created_at),
            Timestamp::parse(&r.updated_at),
        ))
    }
}

/// PostgreSQL implementation of LeadRepository
///
/// Enumerated fields are stored as their display literals. A listed row
/// whose status does not parse is skipped with a warning; unknown optional
/// literals read as unset.
pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    /// Creates a new PostgresLeadRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn list_newest_first(&self) -> Result<Vec<Lead>, String> {
        let rows: Vec<LeadRow> = sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_LEADS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| format!("Failed to load leads: {}", e))?;

        Ok(readable_rows(rows, "leads"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, String> {
        let row: Option<LeadRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_LEADS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("Failed to find lead by id: {}", e))?;

        row.map(Lead::try_from).transpose()
    }

    async fn insert(&self, lead: &Lead) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, phone, language, source, status, stage, quote,
                owner_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::timestamptz, $11::timestamptz)
            "#,
        )
        .bind(lead.id())
        .bind(lead.name())
        .bind(lead.phone().as_str())
        .bind(lead.language().map(|v| v.as_str()))
        .bind(lead.source().map(|v| v.as_str()))
        .bind(lead.status().as_str())
        .bind(lead.stage().map(|v| v.as_str()))
        .bind(lead.quote())
        .bind(lead.owner_id())
        .bind(lead.created_at().to_string())
        .bind(lead.updated_at().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert lead: {}", e))?;

        Ok(())
    }

    async fn update(&self, lead: &Lead) -> Result<(), String> {
        // created_at is never rewritten
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                name = $2,
                phone = $3,
                language = $4,
                source = $5,
                status = $6,
                stage = $7,
                quote = $8,
                owner_id = $9,
                updated_at = $10::timestamptz
            WHERE id = $1
            "#,
        )
        .bind(lead.id())
        .bind(lead.name())
        .bind(lead.phone().as_str())
        .bind(lead.language().map(|v| v.as_str()))
        .bind(lead.source().map(|v| v.as_str()))
        .bind(lead.status().as_str())
        .bind(lead.stage().map(|v| v.as_str()))
        .bind(lead.quote())
        .bind(lead.owner_id())
        .bind(lead.updated_at().to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update lead: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Lead not found: {}", lead.id()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<u64, String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to begin transaction: {}", e))?;

        let notes = sqlx::query("DELETE FROM lead_notes WHERE lead_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| format!("Failed to delete notes of lead: {}", e))?;

        let lead = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| format!("Failed to delete lead: {}", e))?;

        // dropping the transaction rolls the note delete back
        if lead.rows_affected() == 0 {
            return Err(format!("Lead not found: {}", id));
        }

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit lead delete: {}", e))?;
        Ok(notes.rows_affected())
    }

    async fn count_by_owner(&self, owner_id: Uuid) -> Result<u64, String> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| format!("Failed to count leads by owner: {}", e))?;

        Ok(count.max(0) as u64)
    }
}
