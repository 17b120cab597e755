//! Notification data access (`notifications` and `notification_settings`)

use crate::social::notification::models::{
    Notification, NotificationKind, NotificationLinks, NotificationSettings,
};
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

pub struct NotificationDao {
    db: Pool<Sqlite>,
}

impl NotificationDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    fn map_row(m: SqliteRow) -> Result<Notification> {
        let kind: String = m.get("kind");
        let is_read: i64 = m.get("is_read");
        Ok(Notification {
            id: m.get("id"),
            receiver_id: m.get("receiver_id"),
            actor_id: m.get("actor_id"),
            kind: kind.parse::<NotificationKind>()?,
            links: NotificationLinks {
                friendship_id: m.get("friendship_id"),
                event_id: m.get("event_id"),
            },
            is_read: is_read != 0,
            created_at: m.get("created_at"),
        })
    }

    pub async fn insert_notification(&self, n: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, receiver_id, actor_id, kind, friendship_id, event_id, is_read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&n.id)
        .bind(&n.receiver_id)
        .bind(&n.actor_id)
        .bind(n.kind.as_str())
        .bind(&n.links.friendship_id)
        .bind(&n.links.event_id)
        .bind(if n.is_read { 1 } else { 0 })
        .bind(n.created_at)
        .execute(&self.db)
        .await
        .context("failed to insert notification")?;
        Ok(())
    }

    /// Newest first
    pub async fn get_notifications(&self, receiver_id: &str, limit: u32) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, receiver_id, actor_id, kind, friendship_id, event_id, is_read, created_at
            FROM notifications
            WHERE receiver_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(receiver_id)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await
        .context("failed to query notifications")?;

        let notifications = rows
            .into_iter()
            .map(Self::map_row)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "[NotificationDAO] loaded {} notifications for {}",
            notifications.len(),
            receiver_id
        );
        Ok(notifications)
    }

    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r#"
            SELECT id, receiver_id, actor_id, kind, friendship_id, event_id, is_read, created_at
            FROM notifications WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query notification")?;
        row.map(Self::map_row).transpose()
    }

    pub async fn count_unread(&self, receiver_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE receiver_id = ? AND is_read = 0",
        )
        .bind(receiver_id)
        .fetch_one(&self.db)
        .await
        .context("failed to count unread notifications")?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .context("failed to mark notification as read")?;
        Ok(())
    }

    /// Returns the number of rows flipped
    pub async fn mark_all_read(&self, receiver_id: &str) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE receiver_id = ? AND is_read = 0")
                .bind(receiver_id)
                .execute(&self.db)
                .await
                .context("failed to mark notifications as read")?;
        Ok(result.rows_affected())
    }

    pub async fn get_settings(&self, user_id: &str) -> Result<NotificationSettings> {
        let row = sqlx::query(
            r#"
            SELECT friend_requests, event_registrations, event_updates
            FROM notification_settings WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("failed to query notification settings")?;

        Ok(row
            .map(|m| NotificationSettings {
                friend_requests: m.get::<i64, _>("friend_requests") != 0,
                event_registrations: m.get::<i64, _>("event_registrations") != 0,
                event_updates: m.get::<i64, _>("event_updates") != 0,
            })
            .unwrap_or_default())
    }

    pub async fn save_settings(&self, user_id: &str, s: &NotificationSettings) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_settings (
                user_id, friend_requests, event_registrations, event_updates
            ) VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                friend_requests = excluded.friend_requests,
                event_registrations = excluded.event_registrations,
                event_updates = excluded.event_updates
            "#,
        )
        .bind(user_id)
        .bind(s.friend_requests as i64)
        .bind(s.event_registrations as i64)
        .bind(s.event_updates as i64)
        .execute(&self.db)
        .await
        .context("failed to save notification settings")?;
        Ok(())
    }
}
