pub mod client;
pub mod db;
pub mod error;
pub mod event;
pub mod friend;
pub mod notification;
pub mod profile;
pub mod recipe;
pub mod types;

pub use client::{ClientConfig, SocialClient};
pub use error::SocialError;
pub use types::ActionResult;
