//! Notification service: preference-gated creation plus the receiver-side
//! inbox operations.

use crate::social::error::SocialError;
use crate::social::notification::dao::NotificationDao;
use crate::social::notification::models::{
    Notification, NotificationKind, NotificationLinks, NotificationSettings,
};
use crate::social::types::now_millis;
use anyhow::Result;
use sqlx::{Pool, Sqlite};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct NotificationService {
    user_id: String,
    dao: NotificationDao,
}

impl NotificationService {
    pub fn new(db: Pool<Sqlite>, user_id: String) -> Self {
        Self {
            user_id,
            dao: NotificationDao::new(db),
        }
    }

    /// Create a notification for `receiver_id` unless the receiver is the
    /// actor or has this category switched off. Returns the stored row.
    pub async fn notify(
        &self,
        receiver_id: &str,
        actor_id: &str,
        kind: NotificationKind,
        links: NotificationLinks,
    ) -> Result<Option<Notification>> {
        if receiver_id == actor_id {
            return Ok(None);
        }
        let settings = self.dao.get_settings(receiver_id).await?;
        if !settings.allows(kind) {
            debug!(
                "[NotificationService] {} muted {} notifications, skipping",
                receiver_id, kind
            );
            return Ok(None);
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            receiver_id: receiver_id.to_string(),
            actor_id: actor_id.to_string(),
            kind,
            links,
            is_read: false,
            created_at: now_millis(),
        };
        self.dao.insert_notification(&notification).await?;
        info!(
            "[NotificationService] {} -> {}: {}",
            actor_id, receiver_id, kind
        );
        Ok(Some(notification))
    }

    /// Fire-and-forget variant used by the friend and event flows: a failed
    /// notification is logged and never fails the triggering action.
    pub async fn notify_quietly(
        &self,
        receiver_id: &str,
        actor_id: &str,
        kind: NotificationKind,
        links: NotificationLinks,
    ) {
        if let Err(e) = self.notify(receiver_id, actor_id, kind, links).await {
            warn!(
                "[NotificationService] failed to notify {} ({}): {:#}",
                receiver_id, kind, e
            );
        }
    }

    pub async fn get_notifications(&self, limit: u32) -> Result<Vec<Notification>> {
        self.dao.get_notifications(&self.user_id, limit).await
    }

    pub async fn get_unread_count(&self) -> Result<i64> {
        self.dao.count_unread(&self.user_id).await
    }

    /// Only the receiver may mark a notification as read
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<()> {
        let notification = self
            .dao
            .get_notification(notification_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("notification {}", notification_id)))?;
        if notification.receiver_id != self.user_id {
            return Err(SocialError::NotAuthorized(
                "only the receiver can mark a notification as read".into(),
            )
            .into());
        }
        self.dao.mark_read(notification_id).await
    }

    pub async fn mark_all_as_read(&self) -> Result<u64> {
        self.dao.mark_all_read(&self.user_id).await
    }

    pub async fn get_settings(&self) -> Result<NotificationSettings> {
        self.dao.get_settings(&self.user_id).await
    }

    pub async fn update_settings(&self, settings: &NotificationSettings) -> Result<()> {
        info!(
            "[NotificationService] updating settings for {}: {:?}",
            self.user_id, settings
        );
        self.dao.save_settings(&self.user_id, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::db::create_memory_pool;
    use crate::social::db::test_support::init_test_logger;
    use crate::social::profile::ProfileDao;

    async fn setup() -> Result<Pool<Sqlite>> {
        init_test_logger();
        let pool = create_memory_pool().await?;
        let profiles = ProfileDao::new(pool.clone());
        profiles.create_profile("alice", "Alice", "alice@example.com", None).await?;
        profiles.create_profile("bob", "Bob", "bob@example.com", None).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn muted_category_is_not_stored() -> Result<()> {
        let pool = setup().await?;
        let bob = NotificationService::new(pool.clone(), "bob".into());
        bob.update_settings(&NotificationSettings {
            friend_requests: false,
            ..Default::default()
        })
        .await?;

        let alice = NotificationService::new(pool.clone(), "alice".into());
        let sent = alice
            .notify(
                "bob",
                "alice",
                NotificationKind::FriendRequest,
                NotificationLinks::friendship("f1"),
            )
            .await?;
        assert!(sent.is_none());

        let sent = alice
            .notify(
                "bob",
                "alice",
                NotificationKind::EventUpdated,
                NotificationLinks::event("e1"),
            )
            .await?;
        assert!(sent.is_some());
        assert_eq!(bob.get_unread_count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn self_notifications_are_skipped() -> Result<()> {
        let pool = setup().await?;
        let alice = NotificationService::new(pool, "alice".into());
        let sent = alice
            .notify(
                "alice",
                "alice",
                NotificationKind::EventRegistration,
                NotificationLinks::event("e1"),
            )
            .await?;
        assert!(sent.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn only_receiver_marks_read() -> Result<()> {
        let pool = setup().await?;
        let alice = NotificationService::new(pool.clone(), "alice".into());
        let bob = NotificationService::new(pool, "bob".into());

        let n = alice
            .notify(
                "bob",
                "alice",
                NotificationKind::FriendRequest,
                NotificationLinks::friendship("f1"),
            )
            .await?
            .expect("notification stored");

        let err = alice.mark_as_read(&n.id).await.unwrap_err();
        assert!(matches!(
            SocialError::from_anyhow(&err),
            Some(SocialError::NotAuthorized(_))
        ));

        bob.mark_as_read(&n.id).await?;
        assert_eq!(bob.get_unread_count().await?, 0);
        let listed = bob.get_notifications(10).await?;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_read);
        assert_eq!(listed[0].links.friendship_id.as_deref(), Some("f1"));
        Ok(())
    }
}
