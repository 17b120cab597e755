//! Friendship data access (DAO)
//!
//! Every query that asks "is there a row between A and B" checks both
//! directions; callers never need to know who sent the request.

use crate::social::friend::models::{Friendship, FriendshipStatus};
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use tracing::debug;

pub struct FriendDao {
    db: Pool<Sqlite>,
}

impl FriendDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    fn map_row(m: SqliteRow) -> Result<Friendship> {
        let status: String = m.get("status");
        Ok(Friendship {
            id: m.get("id"),
            user_id: m.get("user_id"),
            friend_id: m.get("friend_id"),
            status: status.parse()?,
            created_at: m.get("created_at"),
        })
    }

    /// Find the row between two users, whichever of them sent it
    pub async fn find_between(&self, a: &str, b: &str) -> Result<Option<Friendship>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, friend_id, status, created_at
            FROM friendships
            WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(&self.db)
        .await
        .context("failed to query friendship between users")?;
        row.map(Self::map_row).transpose()
    }

    pub async fn get_friendship(&self, id: &str) -> Result<Option<Friendship>> {
        let row = sqlx::query(
            "SELECT id, user_id, friend_id, status, created_at FROM friendships WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query friendship")?;
        row.map(Self::map_row).transpose()
    }

    pub async fn insert_friendship(&self, f: &Friendship) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO friendships (id, user_id, friend_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&f.id)
        .bind(&f.user_id)
        .bind(&f.friend_id)
        .bind(f.status.as_str())
        .bind(f.created_at)
        .execute(&self.db)
        .await
        .context("failed to insert friendship")?;
        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: FriendshipStatus) -> Result<()> {
        sqlx::query("UPDATE friendships SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.db)
            .await
            .context("failed to update friendship status")?;
        Ok(())
    }

    pub async fn delete_friendship(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM friendships WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .context("failed to delete friendship")?;
        Ok(())
    }

    /// Accepted rows touching `user_id`, in either direction
    pub async fn get_accepted(&self, user_id: &str) -> Result<Vec<Friendship>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, friend_id, status, created_at
            FROM friendships
            WHERE status = 'accepted' AND (user_id = ? OR friend_id = ?)
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("failed to query accepted friendships")?;
        rows.into_iter().map(Self::map_row).collect()
    }

    /// Ids of everyone `user_id` has an accepted friendship with
    pub async fn get_friend_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let ids = self
            .get_accepted(user_id)
            .await?
            .iter()
            .map(|f| f.other_party(user_id).to_string())
            .collect::<HashSet<_>>();
        debug!("[FriendDAO] {} has {} friends", user_id, ids.len());
        Ok(ids)
    }

    /// Pending rows where `user_id` is the recipient, newest first
    pub async fn get_pending_received(&self, user_id: &str) -> Result<Vec<Friendship>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, friend_id, status, created_at
            FROM friendships
            WHERE friend_id = ? AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("failed to query received friend requests")?;
        rows.into_iter().map(Self::map_row).collect()
    }

    /// Pending rows where `user_id` is the requester, newest first
    pub async fn get_pending_sent(&self, user_id: &str) -> Result<Vec<Friendship>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, friend_id, status, created_at
            FROM friendships
            WHERE user_id = ? AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("failed to query sent friend requests")?;
        rows.into_iter().map(Self::map_row).collect()
    }
}
