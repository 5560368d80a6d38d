use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::ProfileRepository;
use crate::domain::user::{Profile, Role, Username};

use super::readable_rows;

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    role: String,
    active: bool,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = String;

    fn try_from(r: ProfileRow) -> Result<Self, Self::Error> {
        let role: Role = r.role.parse().map_err(|e| format!("Profile {}: {}", r.id, e))?;

        Ok(Profile {
            id: r.id,
            username: Username::from_persistence(r.username),
            role,
            active: r.active,
        })
    }
}

/// PostgreSQL implementation of ProfileRepository
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a new PostgresProfileRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn list(&self) -> Result<Vec<Profile>, String> {
        let rows: Vec<ProfileRow> =
            sqlx::query_as("SELECT id, username, role, active FROM profiles ORDER BY username")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| format!("Failed to load profiles: {}", e))?;

        Ok(readable_rows(rows, "profiles"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, String> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT id, username, role, active FROM profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| format!("Failed to find profile by id: {}", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn insert(&self, profile: &Profile) -> Result<(), String> {
        sqlx::query("INSERT INTO profiles (id, username, role, active) VALUES ($1, $2, $3, $4)")
            .bind(profile.id)
            .bind(profile.username.as_str())
            .bind(profile.role.as_str())
            .bind(profile.active)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to insert profile: {}", e))?;

        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<(), String> {
        let result = sqlx::query(
            "UPDATE profiles SET username = $2, role = $3, active = $4 WHERE id = $1",
        )
        .bind(profile.id)
        .bind(profile.username.as_str())
        .bind(profile.role.as_str())
        .bind(profile.active)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update profile: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Profile not found: {}", profile.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to delete profile: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Profile not found: {}", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(username: &str, role: &str) -> ProfileRow {
        ProfileRow {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role: role.to_string(),
            active: true,
        }
    }

    #[test]
    fn unknown_role_row_is_skipped() {
        let rows = vec![row("admin", "admin"), row("eski", "manager"), row("satis", "sales")];

        let profiles: Vec<Profile> = readable_rows(rows, "profiles");

        let names: Vec<&str> = profiles.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["admin", "satis"]);
        assert_eq!(profiles[1].role, Role::Sales);
    }
}
