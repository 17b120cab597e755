//! Notifications created as side effects of friendship and event actions,
//! gated by the receiver's preferences.

pub mod dao;
pub mod models;
pub mod service;

pub use dao::NotificationDao;
pub use models::{Notification, NotificationKind, NotificationLinks, NotificationSettings};
pub use service::NotificationService;
