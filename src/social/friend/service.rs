//! Friendship service layer
//!
//! State machine, per unordered pair of users:
//! `none -> pending -> {accepted, none}` and `accepted -> none`.
//! Rejecting, cancelling and unfriending all delete the row.

use crate::social::error::SocialError;
use crate::social::friend::dao::FriendDao;
use crate::social::friend::listener::{EmptyFriendListener, FriendListener};
use crate::social::friend::models::{Friendship, FriendshipStatus};
use crate::social::notification::{NotificationKind, NotificationLinks, NotificationService};
use crate::social::profile::{Profile, ProfileDao};
use crate::social::types::now_millis;
use anyhow::Result;
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct FriendService {
    /// Acting user
    user_id: String,
    friend_dao: FriendDao,
    profile_dao: ProfileDao,
    notifications: NotificationService,
    listener: Arc<dyn FriendListener>,
}

impl FriendService {
    /// Create a friend service for `user_id` with the no-op listener
    pub fn new(db: Pool<Sqlite>, user_id: String) -> Self {
        Self::with_listener(db, user_id, Arc::new(EmptyFriendListener))
    }

    pub fn with_listener(
        db: Pool<Sqlite>,
        user_id: String,
        listener: Arc<dyn FriendListener>,
    ) -> Self {
        Self {
            friend_dao: FriendDao::new(db.clone()),
            profile_dao: ProfileDao::new(db.clone()),
            notifications: NotificationService::new(db, user_id.clone()),
            user_id,
            listener,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn emit_changed(&self, friendship: &Friendship) -> Result<()> {
        let json = serde_json::to_string(friendship)?;
        self.listener.on_friendship_changed(json).await;
        Ok(())
    }

    async fn load(&self, friendship_id: &str) -> Result<Friendship> {
        self.friend_dao
            .get_friendship(friendship_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("friendship {}", friendship_id)).into())
    }

    fn ensure_pending(friendship: &Friendship, action: &'static str) -> Result<()> {
        if friendship.status != FriendshipStatus::Pending {
            return Err(SocialError::InvalidTransition {
                from: friendship.status.to_string(),
                action,
            }
            .into());
        }
        Ok(())
    }

    /// Insert a new request row. A unique violation on the pair index means
    /// the other party's request landed after our existence check.
    async fn insert_request(&self, friendship: &Friendship) -> Result<()> {
        let Err(e) = self.friend_dao.insert_friendship(friendship).await else {
            return Ok(());
        };
        if let Some(sqlx::Error::Database(db_err)) = e.downcast_ref::<sqlx::Error>() {
            if db_err.is_unique_violation() {
                warn!(
                    "[FriendService] concurrent request between {} and {}",
                    friendship.user_id, friendship.friend_id
                );
                return Err(SocialError::AlreadyExists.into());
            }
        }
        Err(e)
    }

    /// Send a friend request to `to_user_id`.
    ///
    /// Fails with `AlreadyExists` when any row links the pair, whatever its
    /// direction or status.
    pub async fn send_friend_request(&self, to_user_id: &str) -> Result<Friendship> {
        let to_user_id = to_user_id.trim();
        if to_user_id.is_empty() {
            return Err(SocialError::InvalidInput("recipient cannot be empty".into()).into());
        }
        if to_user_id == self.user_id {
            return Err(SocialError::SelfRelation.into());
        }

        if let Some(existing) = self.friend_dao.find_between(&self.user_id, to_user_id).await? {
            debug!(
                "[FriendService] row {} already links {} and {} ({})",
                existing.id, self.user_id, to_user_id, existing.status
            );
            return Err(SocialError::AlreadyExists.into());
        }

        let friendship = Friendship {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            friend_id: to_user_id.to_string(),
            status: FriendshipStatus::Pending,
            created_at: now_millis(),
        };
        self.insert_request(&friendship).await?;
        info!(
            "[FriendService] {} sent a friend request to {}",
            self.user_id, to_user_id
        );

        self.notifications
            .notify_quietly(
                to_user_id,
                &self.user_id,
                NotificationKind::FriendRequest,
                NotificationLinks::friendship(&friendship.id),
            )
            .await;
        self.emit_changed(&friendship).await?;
        Ok(friendship)
    }

    /// Accept a pending request; only its recipient may do so
    pub async fn accept_friend_request(&self, friendship_id: &str) -> Result<Friendship> {
        let mut friendship = self.load(friendship_id).await?;
        if friendship.friend_id != self.user_id {
            return Err(SocialError::NotAuthorized(
                "only the recipient can accept a friend request".into(),
            )
            .into());
        }
        Self::ensure_pending(&friendship, "accept")?;

        self.friend_dao
            .update_status(&friendship.id, FriendshipStatus::Accepted)
            .await?;
        friendship.status = FriendshipStatus::Accepted;
        info!(
            "[FriendService] {} accepted the request from {}",
            self.user_id, friendship.user_id
        );

        self.notifications
            .notify_quietly(
                &friendship.user_id,
                &self.user_id,
                NotificationKind::FriendAccepted,
                NotificationLinks::friendship(&friendship.id),
            )
            .await;
        self.emit_changed(&friendship).await?;
        Ok(friendship)
    }

    /// Reject a pending request; only its recipient may do so. The row is
    /// deleted, returning the pair to "no relation".
    pub async fn reject_friend_request(&self, friendship_id: &str) -> Result<()> {
        let friendship = self.load(friendship_id).await?;
        if friendship.friend_id != self.user_id {
            return Err(SocialError::NotAuthorized(
                "only the recipient can reject a friend request".into(),
            )
            .into());
        }
        Self::ensure_pending(&friendship, "reject")?;

        self.friend_dao.delete_friendship(&friendship.id).await?;
        info!(
            "[FriendService] {} rejected the request from {}",
            self.user_id, friendship.user_id
        );
        self.listener.on_friendship_removed(friendship.id).await;
        Ok(())
    }

    /// Withdraw a pending request; only its sender may do so
    pub async fn cancel_friend_request(&self, friendship_id: &str) -> Result<()> {
        let friendship = self.load(friendship_id).await?;
        if friendship.user_id != self.user_id {
            return Err(SocialError::NotAuthorized(
                "only the sender can cancel a friend request".into(),
            )
            .into());
        }
        Self::ensure_pending(&friendship, "cancel")?;

        self.friend_dao.delete_friendship(&friendship.id).await?;
        info!(
            "[FriendService] {} cancelled the request to {}",
            self.user_id, friendship.friend_id
        );
        self.listener.on_friendship_removed(friendship.id).await;
        Ok(())
    }

    /// Remove an accepted friendship; either side may do so
    pub async fn unfriend(&self, other_user_id: &str) -> Result<()> {
        let friendship = self
            .friend_dao
            .find_between(&self.user_id, other_user_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(format!("friendship with {}", other_user_id)))?;
        if friendship.status != FriendshipStatus::Accepted {
            return Err(SocialError::InvalidTransition {
                from: friendship.status.to_string(),
                action: "unfriend",
            }
            .into());
        }

        self.friend_dao.delete_friendship(&friendship.id).await?;
        info!("[FriendService] {} unfriended {}", self.user_id, other_user_id);
        self.listener.on_friendship_removed(friendship.id).await;
        Ok(())
    }

    /// Status of the row between `a` and `b` in either direction; `None`
    /// when no row exists
    pub async fn get_friendship_status(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<FriendshipStatus>> {
        Ok(self.friend_dao.find_between(a, b).await?.map(|f| f.status))
    }

    /// Accepted friends of the acting user
    pub async fn get_friends(&self) -> Result<Vec<Profile>> {
        let ids = self
            .friend_dao
            .get_friend_ids(&self.user_id)
            .await?
            .into_iter()
            .collect::<Vec<_>>();
        self.profile_dao.get_profiles(&ids).await
    }

    pub async fn get_friend_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        self.friend_dao.get_friend_ids(user_id).await
    }

    /// Pending requests waiting for the acting user's answer
    pub async fn get_received_requests(&self) -> Result<Vec<Friendship>> {
        self.friend_dao.get_pending_received(&self.user_id).await
    }

    /// Pending requests the acting user sent
    pub async fn get_sent_requests(&self) -> Result<Vec<Friendship>> {
        self.friend_dao.get_pending_sent(&self.user_id).await
    }
}
