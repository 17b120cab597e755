//! User profiles: the identity record every relation points at.

pub mod dao;
pub mod models;

pub use dao::ProfileDao;
pub use models::{Profile, ProfileUpdate};
