//! Friendship listener callbacks

use async_trait::async_trait;

/// Notified after every successful friendship mutation made through the
/// service. Payloads are JSON strings.
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// A row was created or changed status; argument is the row as JSON
    async fn on_friendship_changed(&self, friendship_json: String);

    /// A row was deleted (reject, cancel or unfriend)
    async fn on_friendship_removed(&self, friendship_id: String);
}

/// No-op listener
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friendship_changed(&self, _friendship_json: String) {}

    async fn on_friendship_removed(&self, _friendship_id: String) {}
}
