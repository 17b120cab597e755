//! Friendship module
//!
//! Directional friendship rows (requester = `user_id`) that become symmetric
//! once accepted, plus the request/accept/reject/cancel/unfriend transitions.

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

pub use dao::FriendDao;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::{Friendship, FriendshipStatus};
pub use service::FriendService;
