//! Profile data access

use crate::social::error::SocialError;
use crate::social::profile::models::{Profile, ProfileUpdate};
use crate::social::types::now_millis;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

const PROFILE_COLUMNS: &str = "id, display_name, email, avatar_url, created_at, updated_at";

pub struct ProfileDao {
    db: Pool<Sqlite>,
}

impl ProfileDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    fn map_row(m: SqliteRow) -> Profile {
        Profile {
            id: m.get("id"),
            display_name: m.get("display_name"),
            email: m.get("email"),
            avatar_url: m.get("avatar_url"),
            created_at: m.get("created_at"),
            updated_at: m.get("updated_at"),
        }
    }

    /// Insert a new profile (signup)
    pub async fn create_profile(
        &self,
        id: &str,
        display_name: &str,
        email: &str,
        avatar_url: Option<&str>,
    ) -> Result<Profile> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(SocialError::InvalidInput("display name cannot be empty".into()).into());
        }
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO profiles (id, display_name, display_name_lower, email, avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(display_name.to_lowercase())
        .bind(email)
        .bind(avatar_url)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .context("failed to insert profile")?;

        info!("[ProfileDAO] created profile {}", id);
        Ok(Profile {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            avatar_url: avatar_url.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE id = ?",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query profile")?;
        Ok(row.map(Self::map_row))
    }

    /// Load several profiles at once; unknown ids are silently skipped
    pub async fn get_profiles(&self, ids: &[String]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM profiles WHERE id IN ({}) ORDER BY display_name COLLATE NOCASE",
            PROFILE_COLUMNS, placeholders
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&self.db)
            .await
            .context("failed to query profiles")?;
        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<Profile> {
        if let Some(name) = &update.display_name {
            if name.trim().is_empty() {
                return Err(
                    SocialError::InvalidInput("display name cannot be empty".into()).into(),
                );
            }
        }
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                display_name = COALESCE(?, display_name),
                display_name_lower = COALESCE(?, display_name_lower),
                avatar_url = COALESCE(?, avatar_url),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.display_name.as_deref().map(str::trim))
        .bind(
            update
                .display_name
                .as_deref()
                .map(|name| name.trim().to_lowercase()),
        )
        .bind(update.avatar_url.as_deref())
        .bind(now_millis())
        .bind(id)
        .execute(&self.db)
        .await
        .context("failed to update profile")?;

        if result.rows_affected() == 0 {
            return Err(SocialError::NotFound(format!("profile {}", id)).into());
        }
        self.get_profile(id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("profile {}", id)).into())
    }

    /// Case-insensitive substring search on display names.
    ///
    /// Matches against `display_name_lower`, folded in Rust so non-ASCII names
    /// compare correctly. `instr` keeps `%` and `_` literal.
    pub async fn search_profiles(
        &self,
        query: &str,
        exclude_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Profile>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM profiles
            WHERE instr(display_name_lower, ?) > 0 AND id != COALESCE(?, '')
            ORDER BY display_name COLLATE NOCASE
            LIMIT ?
            "#,
            PROFILE_COLUMNS
        ))
        .bind(needle)
        .bind(exclude_id)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await
        .context("failed to search profiles")?;

        debug!("[ProfileDAO] search '{}' returned {} rows", query, rows.len());
        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}
